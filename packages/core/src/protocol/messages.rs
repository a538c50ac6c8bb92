// Типы сообщений протокола
// REST тела и события push-канала

use crate::models::{Message, MessageKind};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Нормальное закрытие соединения (переподключение не нужно)
pub const NORMAL_CLOSURE: u16 = 1000;

/// Соединение оборвалось без close-фрейма
pub const ABNORMAL_CLOSURE: u16 = 1006;

/// Метка времени в том виде, в каком её присылает сервер
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireTimestamp {
    /// RFC 3339 со смещением
    Utc(DateTime<Utc>),
    /// ISO 8601 без зоны, трактуется как UTC
    Naive(NaiveDateTime),
    /// Миллисекунды Unix epoch
    Millis(i64),
}

impl WireTimestamp {
    pub fn to_utc(self) -> DateTime<Utc> {
        match self {
            WireTimestamp::Utc(ts) => ts,
            WireTimestamp::Naive(ts) => Utc.from_utc_datetime(&ts),
            WireTimestamp::Millis(ms) => DateTime::from_timestamp_millis(ms).unwrap_or_default(),
        }
    }
}

// ============================================================================
// REST
// ============================================================================

/// Элемент ответа `GET /chats`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawChat {
    pub chat_id: String,
    #[serde(default)]
    pub participants: Vec<String>,
}

/// Элемент ответа `GET /chats/{id}/messages`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    pub content: String,
    pub timestamp: WireTimestamp,
}

impl RawMessage {
    pub fn into_message(self, chat_id: &str) -> Message {
        Message {
            id: self.id,
            chat_id: chat_id.to_string(),
            sender_id: self.user_id,
            content: self.content,
            kind: self.kind,
            timestamp: self.timestamp.to_utc(),
            read: false,
        }
    }
}

/// Тело `POST /chats/{id}/messages`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMessageBody {
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub content: String,
}

// ============================================================================
// Push канал: сервер -> клиент
// ============================================================================

/// Данные `message_received`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageReceivedData {
    pub id: String,
    #[serde(default)]
    pub chat_id: Option<String>,
    pub user_id: String,
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    pub timestamp: WireTimestamp,
}

impl MessageReceivedData {
    /// `fallback_chat_id` используется, если сервер не прислал `chat_id`
    pub fn into_message(self, fallback_chat_id: Option<&str>) -> Option<Message> {
        let chat_id = self.chat_id.or_else(|| fallback_chat_id.map(str::to_string))?;

        Some(Message {
            id: self.id,
            chat_id,
            sender_id: self.user_id,
            content: self.content,
            kind: self.kind,
            timestamp: self.timestamp.to_utc(),
            read: false,
        })
    }
}

/// Данные `presence_updated`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceData {
    pub user_id: String,
    pub status: String,
}

impl PresenceData {
    pub fn is_typing(&self) -> bool {
        self.status == "typing"
    }
}

/// События от сервера
#[derive(Debug, Clone)]
pub enum ServerEvent {
    MessageReceived(MessageReceivedData),
    PresenceUpdated(PresenceData),
    ChatRead(serde_json::Value),
    Unknown {
        kind: String,
        data: serde_json::Value,
    },
}

// ============================================================================
// Push канал: клиент -> сервер
// ============================================================================

/// Данные `typing`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingData {
    pub chat_id: String,
    pub user_id: String,
    pub is_typing: bool,
}

/// Типы сообщений push-канала (клиент -> сервер)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    Typing(TypingData),
}
