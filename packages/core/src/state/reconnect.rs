use std::time::Duration;

/// Политика автоматического переподключения.
///
/// Счётчик увеличивается до вычисления задержки, поэтому первая попытка ждёт
/// `base × multiplier`, а не `base`. После `max_attempts` попыток политика
/// больше не выдаёт задержек, пока её явно не сбросят.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Количество попыток переподключения
    attempts: u32,
    /// Начальная задержка
    base_delay: Duration,
    /// Во сколько раз растёт задержка с каждой попыткой
    multiplier: u32,
    /// Максимальное количество попыток
    max_attempts: u32,
}

impl ReconnectPolicy {
    pub fn new(base_delay: Duration, multiplier: u32, max_attempts: u32) -> Self {
        Self {
            attempts: 0,
            base_delay,
            multiplier,
            max_attempts,
        }
    }

    /// Засчитать попытку и вернуть задержку перед ней; `None`, если лимит исчерпан
    pub fn next_delay(&mut self) -> Option<Duration> {
        if !self.can_retry() {
            return None;
        }

        self.attempts += 1;
        let factor = self.multiplier.saturating_pow(self.attempts);
        Some(self.base_delay.saturating_mul(factor))
    }

    /// Сбросить счётчик попыток
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Проверить, можно ли продолжать попытки
    pub fn can_retry(&self) -> bool {
        self.attempts < self.max_attempts
    }

    /// Получить количество попыток
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000), 2, 5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_sequence() {
        let mut policy = ReconnectPolicy::default();
        let delays: Vec<u64> = std::iter::from_fn(|| policy.next_delay())
            .map(|d| d.as_millis() as u64)
            .collect();

        assert_eq!(delays, vec![2000, 4000, 8000, 16000, 32000]);
        assert_eq!(policy.attempts(), 5);
        assert!(!policy.can_retry());
        assert_eq!(policy.next_delay(), None);
    }

    #[test]
    fn test_reset() {
        let mut policy = ReconnectPolicy::default();
        policy.next_delay();
        policy.next_delay();
        policy.reset();

        assert_eq!(policy.attempts(), 0);
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(2000)));
    }

    #[test]
    fn test_zero_attempts_never_retries() {
        let mut policy = ReconnectPolicy::new(Duration::from_millis(10), 2, 0);
        assert_eq!(policy.next_delay(), None);
    }
}
