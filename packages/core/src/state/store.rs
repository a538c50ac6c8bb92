use crate::api::{ChatApi, HttpChatApi};
use crate::config::Config;
use crate::fixtures;
use crate::models::{Chat, Message, MessageKind, TypingStatus, User};
use crate::protocol::messages::NewMessageBody;
use crate::state::chat_state::ChatState;
use crate::utils::error::Result;
use crate::utils::ids::{IdGenerator, TempIdGenerator};
use crate::utils::time::{Clock, SystemClock};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, error, info, warn};

const DEFAULT_TYPING_TIMEOUT: Duration = Duration::from_millis(3000);

/// Откуда пришли данные
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Remote,
    /// Встроенный набор для разработки
    Fallback,
}

/// Хранилище чатов.
///
/// Клон дешёвый и указывает на то же состояние. Блокировка берётся только на
/// синхронные участки и никогда не держится через `.await`.
#[derive(Clone)]
pub struct ChatStore {
    state: Arc<Mutex<ChatState>>,
    api: Arc<dyn ChatApi>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    typing_timeout: Duration,
}

impl ChatStore {
    pub fn new(api: Arc<dyn ChatApi>, logged_in_user: Option<User>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ChatState::new(logged_in_user))),
            api,
            clock: Arc::new(SystemClock),
            ids: Arc::new(TempIdGenerator),
            typing_timeout: DEFAULT_TYPING_TIMEOUT,
        }
    }

    /// Стор с HTTP клиентом и агентом из конфигурации
    pub fn from_config(config: &Config) -> Result<Self> {
        let api = HttpChatApi::from_config(config)?;
        Ok(Self::new(Arc::new(api), Some(config.logged_in_user())).with_typing_timeout(config.typing_timeout()))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_typing_timeout(mut self, timeout: Duration) -> Self {
        self.typing_timeout = timeout;
        self
    }

    fn lock(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // === Загрузка ===

    /// Загрузить список чатов, затем по очереди сообщения каждого.
    /// Если список недоступен, подставляется встроенный набор целиком.
    pub async fn fetch_chats(&self) -> DataSource {
        let raw_chats = match self.api.list_chats().await {
            Ok(chats) => chats,
            Err(e) => {
                error!(error = %e, "Failed to fetch chats, loading built-in dataset");
                self.load_mock_data();
                return DataSource::Fallback;
            }
        };

        let now = self.clock.now();
        let chats: Vec<Chat> = raw_chats
            .iter()
            .map(|raw| Chat::from_participant_ids(&raw.chat_id, &raw.participants, now))
            .collect();
        let chat_ids: Vec<String> = chats.iter().map(|c| c.id.clone()).collect();

        {
            let mut state = self.lock();
            state.replace_chats(chats);
            for chat_id in &chat_ids {
                state.messages.remove(chat_id);
            }
        }
        info!(count = chat_ids.len(), "Chats fetched");

        // Строго по одному чату за раз
        for chat_id in &chat_ids {
            self.fetch_messages(chat_id).await;
        }

        DataSource::Remote
    }

    /// Загрузить сообщения чата, перезаписав локальный список
    pub async fn fetch_messages(&self, chat_id: &str) -> DataSource {
        match self.api.list_messages(chat_id).await {
            Ok(raw_messages) => {
                let messages: Vec<Message> = raw_messages
                    .into_iter()
                    .map(|raw| raw.into_message(chat_id))
                    .collect();
                debug!(chat_id, count = messages.len(), "Messages fetched");
                self.lock().replace_messages(chat_id, messages);
                DataSource::Remote
            }
            Err(e) => {
                error!(chat_id, error = %e, "Failed to fetch messages, loading built-in messages");
                self.load_mock_messages(chat_id);
                DataSource::Fallback
            }
        }
    }

    fn load_mock_data(&self) {
        self.lock().replace_chats(fixtures::mock_chats());
    }

    fn load_mock_messages(&self, chat_id: &str) {
        self.lock()
            .messages
            .insert(chat_id.to_string(), fixtures::mock_messages(chat_id));
    }

    // === Отправка ===

    /// Отправить сообщение с оптимистичной вставкой.
    ///
    /// Временное сообщение видно, пока идёт запрос, и удаляется при любом
    /// исходе: при успехе настоящее придёт через push-канал, при ошибке
    /// ошибка возвращается вызывающему.
    pub async fn send_message(&self, chat_id: &str, content: &str, kind: MessageKind) -> Result<()> {
        let (temp_id, body) = {
            let mut state = self.lock();
            let Some(user) = state.logged_in_user.clone() else {
                warn!(chat_id, "Cannot send message without a logged-in user");
                return Ok(());
            };

            let temp = Message {
                id: self.ids.temp_message_id(self.clock.as_ref()),
                chat_id: chat_id.to_string(),
                sender_id: user.id.clone(),
                content: content.to_string(),
                kind,
                timestamp: self.clock.now(),
                read: false,
            };
            let temp_id = temp.id.clone();
            state.push_pending(temp);

            let body = NewMessageBody {
                user_id: user.id,
                kind,
                content: content.to_string(),
            };
            (temp_id, body)
        };

        let outcome = self.api.post_message(chat_id, &body).await;

        self.lock().remove_message(chat_id, &temp_id);

        match outcome {
            Ok(()) => {
                debug!(chat_id, temp_id = %temp_id, "Message posted");
                Ok(())
            }
            Err(e) => {
                error!(chat_id, error = %e, "Failed to send message");
                Err(e)
            }
        }
    }

    // === Изменения из push-канала и UI ===

    /// Идемпотентно добавить полученное сообщение; `true`, если вставили
    pub fn add_message(&self, message: Message) -> bool {
        let now = self.clock.now();
        self.lock().add_message(message, now)
    }

    /// Сделать чат текущим; сообщения грузятся, только если их ещё не загружали
    pub async fn select_chat(&self, chat_id: &str) {
        let needs_fetch = {
            let mut state = self.lock();
            if !state.select(chat_id) {
                warn!(chat_id, "Cannot select unknown chat");
                return;
            }
            !state.has_loaded_messages(chat_id)
        };

        if needs_fetch {
            self.fetch_messages(chat_id).await;
        }
    }

    /// Обновить индикатор набора. `true` гаснет сам через `typing_timeout`;
    /// таймеры не отменяются, каждый лишь записывает `false`.
    pub fn update_typing_status(&self, chat_id: &str, user_id: &str, is_typing: bool) {
        self.lock().set_typing(chat_id, user_id, is_typing);

        if !is_typing {
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(chat_id, user_id, "No async runtime, typing indicator will not expire");
            return;
        };

        let store = self.clone();
        let chat_id = chat_id.to_string();
        let user_id = user_id.to_string();
        let timeout = self.typing_timeout;
        runtime.spawn(async move {
            tokio::time::sleep(timeout).await;
            store.lock().set_typing(&chat_id, &user_id, false);
        });
    }

    pub fn set_connection_status(&self, connected: bool) {
        self.lock().is_connected = connected;
    }

    pub fn set_logged_in_user(&self, user: Option<User>) {
        self.lock().logged_in_user = user;
    }

    // === Чтение ===

    pub fn current_chat(&self) -> Option<Chat> {
        self.lock().current_chat().cloned()
    }

    pub fn current_chat_id(&self) -> Option<String> {
        self.lock().current_chat_id.clone()
    }

    pub fn current_messages(&self) -> Vec<Message> {
        self.lock().current_messages().to_vec()
    }

    pub fn unread_chats_count(&self) -> u32 {
        self.lock().unread_chats_count()
    }

    pub fn is_user_typing(&self, chat_id: &str, user_id: &str) -> bool {
        self.lock().is_user_typing(chat_id, user_id)
    }

    pub fn typing_users(&self, chat_id: &str) -> Vec<TypingStatus> {
        self.lock().typing_users(chat_id).to_vec()
    }

    pub fn chats(&self) -> Vec<Chat> {
        self.lock().chats.clone()
    }

    pub fn chat(&self, chat_id: &str) -> Option<Chat> {
        self.lock().chat(chat_id).cloned()
    }

    /// `None`, если сообщения чата ещё не загружались
    pub fn messages(&self, chat_id: &str) -> Option<Vec<Message>> {
        self.lock().messages.get(chat_id).cloned()
    }

    pub fn logged_in_user(&self) -> Option<User> {
        self.lock().logged_in_user.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.lock().is_connected
    }

    /// Копия всего состояния
    pub fn snapshot(&self) -> ChatState {
        self.lock().clone()
    }
}
