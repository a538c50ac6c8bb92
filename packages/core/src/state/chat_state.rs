// Состояние чатов

use crate::models::{Chat, Message, TypingStatus, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Всё локальное состояние клиента.
///
/// `messages` заполняется лениво: отсутствие ключа означает "ещё не загружали",
/// пустой список означает "загрузили, сообщений нет".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatState {
    pub chats: Vec<Chat>,
    pub current_chat_id: Option<String>,
    pub messages: HashMap<String, Vec<Message>>,
    pub typing_users: HashMap<String, Vec<TypingStatus>>,
    pub logged_in_user: Option<User>,
    pub is_connected: bool,
}

impl ChatState {
    pub fn new(logged_in_user: Option<User>) -> Self {
        Self {
            logged_in_user,
            ..Self::default()
        }
    }

    // === Чтение ===

    pub fn chat(&self, chat_id: &str) -> Option<&Chat> {
        self.chats.iter().find(|c| c.id == chat_id)
    }

    pub fn chat_mut(&mut self, chat_id: &str) -> Option<&mut Chat> {
        self.chats.iter_mut().find(|c| c.id == chat_id)
    }

    pub fn current_chat(&self) -> Option<&Chat> {
        self.current_chat_id.as_deref().and_then(|id| self.chat(id))
    }

    pub fn current_messages(&self) -> &[Message] {
        self.current_chat_id
            .as_deref()
            .and_then(|id| self.messages.get(id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Общее количество непрочитанных по всем чатам
    pub fn unread_chats_count(&self) -> u32 {
        self.chats.iter().map(|c| c.unread_count).sum()
    }

    pub fn is_user_typing(&self, chat_id: &str, user_id: &str) -> bool {
        self.typing_users(chat_id)
            .iter()
            .any(|t| t.user_id == user_id && t.is_typing)
    }

    pub fn typing_users(&self, chat_id: &str) -> &[TypingStatus] {
        self.typing_users
            .get(chat_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_loaded_messages(&self, chat_id: &str) -> bool {
        self.messages.contains_key(chat_id)
    }

    fn is_own_message(&self, message: &Message) -> bool {
        self.logged_in_user
            .as_ref()
            .is_some_and(|user| user.id == message.sender_id)
    }

    // === Изменение ===

    /// Заменить список чатов; текущий чат сбрасывается, если его больше нет
    pub fn replace_chats(&mut self, chats: Vec<Chat>) {
        self.chats = chats;

        if let Some(current) = self.current_chat_id.as_deref() {
            if self.chat(current).is_none() {
                self.current_chat_id = None;
            }
        }
    }

    /// Перезаписать сообщения чата целиком и обновить last_message
    pub fn replace_messages(&mut self, chat_id: &str, messages: Vec<Message>) {
        let last = messages.last().cloned();
        self.messages.insert(chat_id.to_string(), messages);

        if let (Some(chat), Some(last)) = (self.chat_mut(chat_id), last) {
            chat.updated_at = last.timestamp;
            chat.last_message = Some(last);
        }
    }

    /// Оптимистичная вставка: без last_message и без счётчика
    pub fn push_pending(&mut self, message: Message) {
        self.messages
            .entry(message.chat_id.clone())
            .or_default()
            .push(message);
    }

    /// Удалить сообщение по id; `true`, если что-то удалили
    pub fn remove_message(&mut self, chat_id: &str, message_id: &str) -> bool {
        let Some(list) = self.messages.get_mut(chat_id) else {
            return false;
        };

        match list.iter().position(|m| m.id == message_id) {
            Some(index) => {
                list.remove(index);
                true
            }
            None => false,
        }
    }

    /// Идемпотентная вставка полученного сообщения; `true`, если вставили
    pub fn add_message(&mut self, message: Message, now: DateTime<Utc>) -> bool {
        let list = self.messages.entry(message.chat_id.clone()).or_default();

        if list.iter().any(|m| m.id == message.id) {
            return false;
        }
        list.push(message.clone());

        let is_own = self.is_own_message(&message);
        if let Some(chat) = self.chat_mut(&message.chat_id) {
            chat.last_message = Some(message);
            chat.updated_at = now;

            // Непрочитанные считаются только для чужих сообщений
            if !is_own {
                chat.unread_count += 1;
            }
        }

        true
    }

    /// Сделать чат текущим и отметить прочитанным.
    /// Возвращает `false`, если такого чата нет.
    pub fn select(&mut self, chat_id: &str) -> bool {
        let Some(chat) = self.chat_mut(chat_id) else {
            return false;
        };

        chat.unread_count = 0;
        self.current_chat_id = Some(chat_id.to_string());
        true
    }

    /// Upsert индикатора набора по (chat_id, user_id)
    pub fn set_typing(&mut self, chat_id: &str, user_id: &str, is_typing: bool) {
        let entries = self.typing_users.entry(chat_id.to_string()).or_default();

        match entries.iter_mut().find(|t| t.user_id == user_id) {
            Some(entry) => entry.is_typing = is_typing,
            None => entries.push(TypingStatus {
                user_id: user_id.to_string(),
                chat_id: chat_id.to_string(),
                is_typing,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageKind;

    fn agent() -> User {
        User::from_id("agent_daniel")
    }

    fn message(id: &str, chat_id: &str, sender_id: &str) -> Message {
        Message {
            id: id.to_string(),
            chat_id: chat_id.to_string(),
            sender_id: sender_id.to_string(),
            content: format!("content of {}", id),
            kind: MessageKind::Text,
            timestamp: Utc::now(),
            read: false,
        }
    }

    fn state_with_chat(chat_id: &str) -> ChatState {
        let mut state = ChatState::new(Some(agent()));
        let ids = vec!["customer_1".to_string(), "agent_daniel".to_string()];
        state.replace_chats(vec![Chat::from_participant_ids(chat_id, &ids, Utc::now())]);
        state
    }

    #[test]
    fn test_add_message_is_idempotent() {
        let mut state = state_with_chat("chat_1");

        assert!(state.add_message(message("m1", "chat_1", "customer_1"), Utc::now()));
        assert!(!state.add_message(message("m1", "chat_1", "customer_1"), Utc::now()));
        assert!(state.add_message(message("m2", "chat_1", "customer_1"), Utc::now()));

        assert_eq!(state.messages["chat_1"].len(), 2);
        assert_eq!(state.chat("chat_1").unwrap().unread_count, 2);
        assert_eq!(state.chat("chat_1").unwrap().last_message.as_ref().unwrap().id, "m2");
    }

    #[test]
    fn test_own_messages_are_not_unread() {
        let mut state = state_with_chat("chat_1");

        state.add_message(message("m1", "chat_1", "agent_daniel"), Utc::now());
        state.add_message(message("m2", "chat_1", "bot_user"), Utc::now());

        assert_eq!(state.chat("chat_1").unwrap().unread_count, 1);
        assert_eq!(state.unread_chats_count(), 1);
    }

    #[test]
    fn test_add_message_for_unknown_chat_creates_list() {
        let mut state = ChatState::new(None);
        assert!(state.add_message(message("m1", "ghost", "customer_1"), Utc::now()));
        assert_eq!(state.messages["ghost"].len(), 1);
        assert!(state.chats.is_empty());
    }

    #[test]
    fn test_select_resets_unread() {
        let mut state = state_with_chat("chat_1");
        state.add_message(message("m1", "chat_1", "customer_1"), Utc::now());

        assert!(state.select("chat_1"));
        assert_eq!(state.current_chat().unwrap().unread_count, 0);
        assert_eq!(state.current_messages().len(), 1);

        assert!(!state.select("missing"));
        assert_eq!(state.current_chat_id.as_deref(), Some("chat_1"));
    }

    #[test]
    fn test_replace_chats_clears_stale_selection() {
        let mut state = state_with_chat("chat_1");
        state.select("chat_1");
        state.replace_chats(Vec::new());
        assert!(state.current_chat_id.is_none());
        assert!(state.current_messages().is_empty());
    }

    #[test]
    fn test_replace_messages_updates_last_message() {
        let mut state = state_with_chat("chat_1");
        let mut last = message("m2", "chat_1", "customer_1");
        last.timestamp = Utc::now() + chrono::Duration::minutes(5);

        state.replace_messages("chat_1", vec![message("m1", "chat_1", "customer_1"), last.clone()]);

        let chat = state.chat("chat_1").unwrap();
        assert_eq!(chat.last_message.as_ref(), Some(&last));
        assert_eq!(chat.updated_at, last.timestamp);

        state.replace_messages("chat_1", Vec::new());
        assert!(state.has_loaded_messages("chat_1"));
        assert_eq!(state.chat("chat_1").unwrap().last_message.as_ref(), Some(&last));
    }

    #[test]
    fn test_pending_insert_and_remove() {
        let mut state = state_with_chat("chat_1");
        state.push_pending(message("temp_1", "chat_1", "agent_daniel"));

        assert_eq!(state.chat("chat_1").unwrap().unread_count, 0);
        assert!(state.chat("chat_1").unwrap().last_message.is_none());
        assert!(state.remove_message("chat_1", "temp_1"));
        assert!(!state.remove_message("chat_1", "temp_1"));
        assert!(state.messages["chat_1"].is_empty());
    }

    #[test]
    fn test_typing_upsert() {
        let mut state = ChatState::new(None);
        state.set_typing("chat_1", "u1", true);
        state.set_typing("chat_1", "u1", false);
        state.set_typing("chat_1", "u2", true);

        assert_eq!(state.typing_users("chat_1").len(), 2);
        assert!(!state.is_user_typing("chat_1", "u1"));
        assert!(state.is_user_typing("chat_1", "u2"));
        assert!(state.typing_users("chat_2").is_empty());
    }
}
