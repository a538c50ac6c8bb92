//! Shared test doubles: in-memory REST API, scripted push transport,
//! fixed clock and sequential ids.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sailer_chat_core::api::ChatApi;
use sailer_chat_core::models::{MessageKind, User};
use sailer_chat_core::protocol::messages::{NewMessageBody, RawChat, RawMessage, WireTimestamp};
use sailer_chat_core::protocol::transport::{
    InboundFrame, OutboundFrame, PushTransport, TransportChannel,
};
use sailer_chat_core::utils::ids::IdGenerator;
use sailer_chat_core::utils::time::Clock;
use sailer_chat_core::{ChatError, ChatStore, Config, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::{oneshot, Notify};

// ============================================================================
// REST
// ============================================================================

#[derive(Default)]
pub struct MockChatApi {
    pub chats: Mutex<Vec<RawChat>>,
    pub messages: Mutex<HashMap<String, Vec<RawMessage>>>,

    pub fail_chats: AtomicBool,
    pub fail_messages: AtomicBool,
    pub fail_post: AtomicBool,

    pub list_chats_calls: AtomicUsize,
    /// Chat ids in the order their messages were requested
    pub message_requests: Mutex<Vec<String>>,
    pub posted: Mutex<Vec<(String, NewMessageBody)>>,

    /// When set, `post_message` waits for it before answering
    pub post_gate: Mutex<Option<oneshot::Receiver<()>>>,
    pub post_started: Notify,
}

impl MockChatApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// API where every call fails
    pub fn offline() -> Arc<Self> {
        let api = Self::default();
        api.fail_chats.store(true, Ordering::SeqCst);
        api.fail_messages.store(true, Ordering::SeqCst);
        api.fail_post.store(true, Ordering::SeqCst);
        Arc::new(api)
    }

    pub fn with_chat(&self, chat_id: &str, participants: &[&str]) {
        self.chats.lock().unwrap().push(RawChat {
            chat_id: chat_id.to_string(),
            participants: participants.iter().map(|p| p.to_string()).collect(),
        });
    }

    pub fn with_messages(&self, chat_id: &str, messages: Vec<RawMessage>) {
        self.messages.lock().unwrap().insert(chat_id.to_string(), messages);
    }

    /// Hold the next `post_message` until the returned sender fires
    pub fn gate_post(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.post_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn message_requests(&self) -> Vec<String> {
        self.message_requests.lock().unwrap().clone()
    }

    pub fn posted(&self) -> Vec<(String, NewMessageBody)> {
        self.posted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatApi for MockChatApi {
    async fn list_chats(&self) -> Result<Vec<RawChat>> {
        self.list_chats_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_chats.load(Ordering::SeqCst) {
            return Err(ChatError::Network("connection refused".to_string()));
        }
        Ok(self.chats.lock().unwrap().clone())
    }

    async fn list_messages(&self, chat_id: &str) -> Result<Vec<RawMessage>> {
        self.message_requests.lock().unwrap().push(chat_id.to_string());
        if self.fail_messages.load(Ordering::SeqCst) {
            return Err(ChatError::Network("connection refused".to_string()));
        }
        Ok(self
            .messages
            .lock()
            .unwrap()
            .get(chat_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn post_message(&self, chat_id: &str, body: &NewMessageBody) -> Result<()> {
        self.post_started.notify_one();

        let gate = self.post_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        if self.fail_post.load(Ordering::SeqCst) {
            return Err(ChatError::Network("HTTP 500 Internal Server Error".to_string()));
        }
        self.posted
            .lock()
            .unwrap()
            .push((chat_id.to_string(), body.clone()));
        Ok(())
    }
}

pub fn raw_message(id: &str, user_id: &str, content: &str, minute: u32) -> RawMessage {
    RawMessage {
        id: id.to_string(),
        user_id: user_id.to_string(),
        kind: MessageKind::Text,
        content: content.to_string(),
        timestamp: WireTimestamp::Utc(Utc.with_ymd_and_hms(2024, 1, 15, 14, minute, 0).unwrap()),
    }
}

// ============================================================================
// Push transport
// ============================================================================

/// Server side of one opened connection
pub struct MockConnection {
    pub url: String,
    pub to_client: UnboundedSender<InboundFrame>,
    pub from_client: UnboundedReceiver<OutboundFrame>,
}

impl MockConnection {
    pub fn push(&self, text: &str) {
        self.to_client.send(InboundFrame::Text(text.to_string())).unwrap();
    }

    pub fn close(&self, code: u16) {
        self.to_client
            .send(InboundFrame::Closed {
                code,
                reason: String::new(),
            })
            .unwrap();
    }
}

pub struct MockTransport {
    opened: UnboundedSender<MockConnection>,
    refuse: AtomicBool,
    attempts: AtomicUsize,
}

impl MockTransport {
    /// Transport plus the stream of connections it opens
    pub fn new() -> (Arc<Self>, UnboundedReceiver<MockConnection>) {
        let (opened, connections) = mpsc::unbounded_channel();
        let transport = Self {
            opened,
            refuse: AtomicBool::new(false),
            attempts: AtomicUsize::new(0),
        };
        (Arc::new(transport), connections)
    }

    /// Transport that refuses every connection
    pub fn refusing() -> Arc<Self> {
        let (transport, _connections) = Self::new();
        transport.refuse.store(true, Ordering::SeqCst);
        transport
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PushTransport for MockTransport {
    async fn open(&self, url: &str) -> Result<TransportChannel> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.refuse.load(Ordering::SeqCst) {
            return Err(ChatError::Connection(format!("connection to {} refused", url)));
        }

        let (outbound, from_client) = mpsc::unbounded_channel();
        let (to_client, inbound) = mpsc::unbounded_channel();
        let _ = self.opened.send(MockConnection {
            url: url.to_string(),
            to_client,
            from_client,
        });

        Ok(TransportChannel { outbound, inbound })
    }
}

// ============================================================================
// Clock, ids, setup
// ============================================================================

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 15, 0, 0).unwrap()
}

#[derive(Default)]
pub struct SequentialIds(AtomicUsize);

impl IdGenerator for SequentialIds {
    fn temp_message_id(&self, _clock: &dyn Clock) -> String {
        format!("temp_{}", self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

pub fn agent() -> User {
    Config::default().logged_in_user()
}

pub fn test_config() -> Config {
    Config {
        api_base: "http://api.test".to_string(),
        ws_base: "ws://push.test".to_string(),
        ..Config::default()
    }
}

/// Store logged in as the default agent, with fixed time and ids
pub fn store_with(api: Arc<MockChatApi>) -> ChatStore {
    ChatStore::new(api, Some(agent()))
        .with_clock(Arc::new(FixedClock(fixed_now())))
        .with_id_generator(Arc::new(SequentialIds::default()))
}

/// Let spawned tasks run until they block
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
