// Состояние клиента: стор чатов и push-канал

pub mod chat_state;
pub mod connection;
pub mod reconnect;
pub mod store;

pub use chat_state::ChatState;
pub use connection::{ConnectionHandler, ConnectionScope};
pub use reconnect::ReconnectPolicy;
pub use store::{ChatStore, DataSource};
