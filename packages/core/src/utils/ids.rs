// Генерация временных идентификаторов сообщений

use crate::utils::time::{current_timestamp_millis, Clock};
use rand::Rng;

/// Префикс id оптимистично вставленного сообщения
pub const TEMP_ID_PREFIX: &str = "temp_";

/// Длина случайного суффикса (base36)
const SUFFIX_LEN: usize = 9;

pub trait IdGenerator: Send + Sync {
    /// Сгенерировать уникальный id для временного сообщения
    fn temp_message_id(&self, clock: &dyn Clock) -> String;
}

/// `temp_<unix-millis>_<9 символов base36>`
#[derive(Debug, Clone, Copy, Default)]
pub struct TempIdGenerator;

impl IdGenerator for TempIdGenerator {
    fn temp_message_id(&self, clock: &dyn Clock) -> String {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..SUFFIX_LEN)
            .filter_map(|_| std::char::from_digit(rng.gen_range(0..36), 36))
            .collect();

        format!(
            "{}{}_{}",
            TEMP_ID_PREFIX,
            current_timestamp_millis(clock),
            suffix
        )
    }
}

pub fn is_temp_id(id: &str) -> bool {
    id.starts_with(TEMP_ID_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::time::SystemClock;

    #[test]
    fn test_temp_id_format() {
        let id = TempIdGenerator.temp_message_id(&SystemClock);
        assert!(is_temp_id(&id));

        let parts: Vec<&str> = id.splitn(3, '_').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_temp_ids_differ() {
        let a = TempIdGenerator.temp_message_id(&SystemClock);
        let b = TempIdGenerator.temp_message_id(&SystemClock);
        assert_ne!(a, b);
    }
}
