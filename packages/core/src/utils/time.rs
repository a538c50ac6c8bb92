// Источник времени

use chrono::{DateTime, Utc};

/// Часы, которые стор получает снаружи (в тестах подменяются фиксированными)
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Системные часы
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Текущее время в миллисекундах Unix epoch
pub fn current_timestamp_millis(clock: &dyn Clock) -> i64 {
    clock.now().timestamp_millis()
}
