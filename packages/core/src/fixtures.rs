// Встроенный набор данных для разработки.
// Подставляется целиком, когда REST API недоступен.

use crate::models::{Chat, Message, MessageKind, User, UserType};
use chrono::{DateTime, TimeZone, Utc};

/// 2024-01-15 hh:mm:00 UTC
fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, hour, minute, 0)
        .single()
        .unwrap_or_default()
}

fn user(id: &str, name: &str, user_type: UserType) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        user_type,
        avatar: None,
    }
}

fn text(id: &str, chat_id: &str, sender_id: &str, content: &str, timestamp: DateTime<Utc>) -> Message {
    Message {
        id: id.to_string(),
        chat_id: chat_id.to_string(),
        sender_id: sender_id.to_string(),
        content: content.to_string(),
        kind: MessageKind::Text,
        timestamp,
        read: false,
    }
}

pub fn mock_users() -> Vec<User> {
    vec![
        user("customer_1", "João Silva", UserType::Customer),
        user("customer_2", "Maria Santos", UserType::Customer),
        user("bot_user", "Sailer AI", UserType::Bot),
        user("agent_daniel", "Daniel Silva", UserType::Agent),
    ]
}

pub fn mock_chats() -> Vec<Chat> {
    let mut users = mock_users().into_iter();
    let (Some(joao), Some(maria), Some(bot), Some(agent)) =
        (users.next(), users.next(), users.next(), users.next())
    else {
        return Vec::new();
    };

    vec![
        Chat {
            id: "chat_1".to_string(),
            name: "João Silva".to_string(),
            participants: vec![joao, bot.clone(), agent.clone()],
            last_message: Some(text(
                "msg_1",
                "chat_1",
                "customer_1",
                "Preciso de ajuda com meu pedido",
                at(14, 30),
            )),
            unread_count: 2,
            is_active: true,
            created_at: at(10, 0),
            updated_at: at(14, 30),
        },
        Chat {
            id: "chat_2".to_string(),
            name: "Maria Santos".to_string(),
            participants: vec![maria, bot, agent],
            last_message: Some(text(
                "msg_2",
                "chat_2",
                "bot_user",
                "Posso ajudar com mais alguma coisa?",
                at(13, 45),
            )),
            unread_count: 0,
            is_active: true,
            created_at: at(9, 0),
            updated_at: at(13, 45),
        },
    ]
}

/// Одинаковая переписка для любого чата, меняется только `chat_id`
pub fn mock_messages(chat_id: &str) -> Vec<Message> {
    vec![
        text("msg_1", chat_id, "customer_1", "Olá, preciso de ajuda com meu pedido", at(14, 0)),
        text(
            "msg_2",
            chat_id,
            "bot_user",
            "Olá! Claro, posso ajudar você com seu pedido. Pode me fornecer o número do pedido?",
            at(14, 1),
        ),
        text("msg_3", chat_id, "customer_1", "O número é #12345", at(14, 2)),
        text(
            "msg_4",
            chat_id,
            "bot_user",
            "Encontrei seu pedido! Vejo que foi feito ontem. Qual é a sua dúvida específica?",
            at(14, 3),
        ),
        text("msg_5", chat_id, "customer_1", "Preciso alterar o endereço de entrega", at(14, 30)),
    ]
}
