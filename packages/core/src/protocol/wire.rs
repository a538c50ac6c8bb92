// Wire format (JSON) push-канала
// Входящий фрейм: `{ "event" | "type": <kind>, "data": {...} }`

use crate::protocol::messages::{ClientEvent, MessageReceivedData, PresenceData, ServerEvent};
use crate::utils::error::{ChatError, Result};
use serde::Deserialize;

/// Конверт входящего фрейма. Сервер кладёт вид события либо в `event`, либо в `type`.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    event: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    data: serde_json::Value,
}

/// Распаковать текстовый фрейм в ServerEvent (сервер -> клиент)
pub fn decode_server_event(text: &str) -> Result<ServerEvent> {
    let envelope: Envelope = serde_json::from_str(text)?;

    let kind = envelope.event.or(envelope.kind).ok_or_else(|| {
        ChatError::Serialization("push frame has neither `event` nor `type`".to_string())
    })?;

    let event = match kind.as_str() {
        "message_received" => {
            ServerEvent::MessageReceived(MessageReceivedData::deserialize(envelope.data)?)
        }
        "presence_updated" => ServerEvent::PresenceUpdated(PresenceData::deserialize(envelope.data)?),
        "chat_read" => ServerEvent::ChatRead(envelope.data),
        _ => ServerEvent::Unknown {
            kind,
            data: envelope.data,
        },
    };

    Ok(event)
}

/// Упаковать ClientEvent в JSON (клиент -> сервер)
pub fn encode_client_event(event: &ClientEvent) -> Result<String> {
    serde_json::to_string(event).map_err(|e| ChatError::Serialization(format!("push frame encode error: {}", e)))
}
