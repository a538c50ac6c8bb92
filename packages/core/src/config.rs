//! Централизованная конфигурация для Sailer Chat Core
//!
//! Все адреса и настройки клиента определяются здесь,
//! чтобы избежать хардкода по всему проекту.

use crate::models::{User, UserType};
use crate::state::reconnect::ReconnectPolicy;
use std::time::Duration;

/// REST база по умолчанию (можно задать `API_BASE` при сборке)
const DEFAULT_API_BASE: &str = match option_env!("API_BASE") {
    Some(base) => base,
    None => "http://localhost:8000",
};

/// База push-канала по умолчанию (можно задать `WS_BASE` при сборке)
const DEFAULT_WS_BASE: &str = match option_env!("WS_BASE") {
    Some(base) => base,
    None => "ws://localhost:8000",
};

/// Основная структура конфигурации
#[derive(Debug, Clone)]
pub struct Config {
    // ============================================
    // АДРЕСА
    // ============================================

    /// Базовый адрес REST API
    pub api_base: String,

    /// Базовый адрес push-канала (WebSocket)
    pub ws_base: String,

    /// Таймаут одного HTTP запроса (в миллисекундах)
    pub request_timeout_ms: u64,

    // ============================================
    // ПЕРЕПОДКЛЮЧЕНИЕ
    // ============================================

    /// Базовая задержка для exponential backoff (в миллисекундах)
    pub reconnect_base_delay_ms: u64,

    /// Множитель backoff
    pub reconnect_multiplier: u32,

    /// Максимальное количество попыток переподключения
    pub max_reconnect_attempts: u32,

    // ============================================
    // ИНДИКАТОР НАБОРА
    // ============================================

    /// Через сколько миллисекунд "печатает" гаснет сам
    pub typing_timeout_ms: u64,

    // ============================================
    // ТЕКУЩИЙ АГЕНТ
    // ============================================

    pub agent_id: String,
    pub agent_name: String,
    pub agent_avatar: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            ws_base: DEFAULT_WS_BASE.to_string(),
            request_timeout_ms: 10_000,

            reconnect_base_delay_ms: 1000,
            reconnect_multiplier: 2,
            max_reconnect_attempts: 5,

            typing_timeout_ms: 3000,

            agent_id: "agent_daniel".to_string(),
            agent_name: "Daniel Silva".to_string(),
            agent_avatar: Some("/avatars/daniel.jpg".to_string()),
        }
    }
}

impl Config {
    /// Создать конфигурацию из переменных окружения
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // Переопределяем значения из env, если они заданы
        if let Ok(val) = std::env::var("API_BASE") {
            config.api_base = val;
        }

        if let Ok(val) = std::env::var("WS_BASE") {
            config.ws_base = val;
        }

        if let Ok(val) = std::env::var("REQUEST_TIMEOUT_MS") {
            if let Ok(parsed) = val.parse() {
                config.request_timeout_ms = parsed;
            }
        }

        if let Ok(val) = std::env::var("RECONNECT_BASE_DELAY_MS") {
            if let Ok(parsed) = val.parse() {
                config.reconnect_base_delay_ms = parsed;
            }
        }

        if let Ok(val) = std::env::var("MAX_RECONNECT_ATTEMPTS") {
            if let Ok(parsed) = val.parse() {
                config.max_reconnect_attempts = parsed;
            }
        }

        if let Ok(val) = std::env::var("TYPING_TIMEOUT_MS") {
            if let Ok(parsed) = val.parse() {
                config.typing_timeout_ms = parsed;
            }
        }

        if let Ok(val) = std::env::var("AGENT_ID") {
            config.agent_id = val;
        }

        if let Ok(val) = std::env::var("AGENT_NAME") {
            config.agent_name = val;
        }

        if let Ok(val) = std::env::var("AGENT_AVATAR") {
            config.agent_avatar = if val.is_empty() { None } else { Some(val) };
        }

        config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn typing_timeout(&self) -> Duration {
        Duration::from_millis(self.typing_timeout_ms)
    }

    /// Политика переподключения с параметрами из конфигурации
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::new(
            Duration::from_millis(self.reconnect_base_delay_ms),
            self.reconnect_multiplier,
            self.max_reconnect_attempts,
        )
    }

    /// Залогиненный агент
    pub fn logged_in_user(&self) -> User {
        User {
            id: self.agent_id.clone(),
            name: self.agent_name.clone(),
            user_type: UserType::from_user_id(&self.agent_id),
            avatar: self.agent_avatar.clone(),
        }
    }
}
