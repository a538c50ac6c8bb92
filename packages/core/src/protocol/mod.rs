// Протокол обмена с сервером

pub mod messages;
pub mod transport;
pub mod wire;

pub use transport::{ConnectionState, PushTransport, WebSocketTransport};
