// Клиент REST API чатов

pub mod client;

use crate::protocol::messages::{NewMessageBody, RawChat, RawMessage};
use crate::utils::error::Result;
use async_trait::async_trait;

pub use client::HttpChatApi;

/// Удалённый источник данных чатов
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// `GET /chats`
    async fn list_chats(&self) -> Result<Vec<RawChat>>;

    /// `GET /chats/{id}/messages`
    async fn list_messages(&self, chat_id: &str) -> Result<Vec<RawMessage>>;

    /// `POST /chats/{id}/messages`
    async fn post_message(&self, chat_id: &str, body: &NewMessageBody) -> Result<()>;
}
