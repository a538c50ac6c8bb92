// Консольный клиент для ручной проверки против живого бэкенда

use anyhow::{Context, Result};
use sailer_chat_core::models::user_display_name;
use sailer_chat_core::utils::logging::init_logging;
use sailer_chat_core::{ChatStore, Config, ConnectionHandler, DataSource, WebSocketTransport};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let config = Config::from_env();
    info!(api_base = %config.api_base, ws_base = %config.ws_base, "Starting sailer console");

    let store = ChatStore::from_config(&config).context("failed to build chat store")?;

    if store.fetch_chats().await == DataSource::Fallback {
        warn!("Backend unavailable, showing built-in dataset");
    }

    let chat_id = std::env::var("CHAT_ID")
        .ok()
        .or_else(|| store.chats().first().map(|chat| chat.id.clone()))
        .context("no chats to open")?;

    store.select_chat(&chat_id).await;
    let Some(chat) = store.current_chat() else {
        anyhow::bail!("chat {} not found", chat_id);
    };
    info!(chat_id = %chat.id, name = %chat.name, unread = store.unread_chats_count(), "Chat selected");

    let handler = ConnectionHandler::new(store.clone(), Arc::new(WebSocketTransport::new()), &config);
    let scope = handler.scope();

    let mut shown = 0;
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                let messages = store.current_messages();
                for message in messages.iter().skip(shown) {
                    info!(
                        from = %user_display_name(&message.sender_id),
                        at = %message.timestamp.format("%H:%M"),
                        "{}",
                        message.content
                    );
                }
                shown = messages.len();
            }
        }
    }

    info!(state = ?scope.state(), "Shutting down");
    drop(scope);
    Ok(())
}
