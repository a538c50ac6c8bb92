// Sailer Chat Core
// Клиентское ядро чата поддержки: стор чатов, REST клиент и push-канал

#![warn(clippy::all)]

// Модули
pub mod api;
pub mod config;
pub mod fixtures;
pub mod models;
pub mod protocol;
pub mod state;
pub mod utils;

// Re-exports для удобства
pub use api::{ChatApi, HttpChatApi};
pub use config::Config;
pub use models::{Chat, Message, MessageKind, TypingStatus, User, UserType};
pub use protocol::{ConnectionState, PushTransport, WebSocketTransport};
pub use state::{ChatStore, ConnectionHandler, ConnectionScope, DataSource};
pub use utils::error::{ChatError, Result};
