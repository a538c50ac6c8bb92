// Доменная модель: пользователи, сообщения, чаты, индикаторы набора

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Id бота поддержки
pub const BOT_USER_ID: &str = "bot_user";
const BOT_DISPLAY_NAME: &str = "Sailer AI";
const CUSTOMER_PREFIX: &str = "customer_";
const AGENT_PREFIX: &str = "agent_";
const AGENT_DISPLAY_NAME: &str = "Daniel Silva";
const CUSTOMER_NAMES: [&str; 4] = ["João Silva", "Maria Santos", "Pedro Costa", "Ana Oliveira"];

/// Роль участника
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Customer,
    Agent,
    Bot,
}

impl UserType {
    /// Роль выводится из префикса id; неизвестные id считаются клиентами
    pub fn from_user_id(user_id: &str) -> Self {
        if user_id == BOT_USER_ID {
            UserType::Bot
        } else if user_id.starts_with(AGENT_PREFIX) {
            UserType::Agent
        } else {
            UserType::Customer
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub user_type: UserType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl User {
    /// Собрать пользователя из голого id участника
    pub fn from_id(user_id: &str) -> Self {
        Self {
            id: user_id.to_string(),
            name: user_display_name(user_id),
            user_type: UserType::from_user_id(user_id),
            avatar: None,
        }
    }
}

/// Отображаемое имя по id
pub fn user_display_name(user_id: &str) -> String {
    if user_id == BOT_USER_ID {
        return BOT_DISPLAY_NAME.to_string();
    }

    if let Some(number) = user_id.strip_prefix(CUSTOMER_PREFIX) {
        return number
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| CUSTOMER_NAMES.get(index))
            .map(|name| name.to_string())
            .unwrap_or_else(|| format!("Cliente {}", number));
    }

    if user_id.starts_with(AGENT_PREFIX) {
        return AGENT_DISPLAY_NAME.to_string();
    }

    user_id.to_string()
}

/// Название чата: имя первого клиента, иначе первый участник, иначе "Chat"
pub fn chat_display_name(participants: &[String]) -> String {
    if let Some(customer) = participants.iter().find(|p| p.starts_with(CUSTOMER_PREFIX)) {
        return user_display_name(customer);
    }

    participants
        .first()
        .cloned()
        .unwrap_or_else(|| "Chat".to_string())
}

/// Тип содержимого сообщения
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    Audio,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    pub name: String,
    pub participants: Vec<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<Message>,
    pub unread_count: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    /// Чат из списка id участников (порядок сохраняется, дубликаты отбрасываются)
    pub fn from_participant_ids(chat_id: &str, participant_ids: &[String], now: DateTime<Utc>) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(participant_ids.len());
        for id in participant_ids {
            if !unique.contains(id) {
                unique.push(id.clone());
            }
        }

        Self {
            id: chat_id.to_string(),
            name: chat_display_name(&unique),
            participants: unique.iter().map(|id| User::from_id(id)).collect(),
            last_message: None,
            unread_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingStatus {
    pub user_id: String,
    pub chat_id: String,
    pub is_typing: bool,
}
