// Логирование

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Установить глобальный tracing subscriber.
///
/// Уровень читается из `RUST_LOG` (по умолчанию `info`). Повторный вызов
/// ничего не делает, поэтому функцию можно звать и из тестов, и из бинаря.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer().with_target(true).with_level(true);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}
