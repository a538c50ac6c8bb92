// Push-канал чата: подключение, разбор событий, переподключение

use crate::config::Config;
use crate::protocol::messages::{ClientEvent, ServerEvent, TypingData, ABNORMAL_CLOSURE, NORMAL_CLOSURE};
use crate::protocol::transport::{
    channel_url, ConnectionState, InboundFrame, OutboundFrame, PushTransport, TransportChannel,
};
use crate::protocol::wire::{decode_server_event, encode_client_event};
use crate::state::reconnect::ReconnectPolicy;
use crate::state::store::ChatStore;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const DISCONNECT_REASON: &str = "Client disconnecting";

/// Изменяемая часть обработчика
struct Session {
    state: ConnectionState,
    policy: ReconnectPolicy,
    chat_id: Option<String>,
    /// Отправитель в открытый сокет; есть только в состоянии Connected
    outbound: Option<UnboundedSender<OutboundFrame>>,
    /// Сигнал остановки фоновой задачи текущей сессии
    shutdown: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

struct Inner {
    store: ChatStore,
    transport: Arc<dyn PushTransport>,
    ws_base: String,
    default_chat_id: Option<String>,
    session: Mutex<Session>,
}

/// Обработчик push-канала.
///
/// Держит не больше одного соединения. Входящие события превращаются в
/// изменения `ChatStore`, обрывы соединения обрабатываются по
/// `ReconnectPolicy`. Закрытие с кодом 1000 и `disconnect()` переподключения
/// не вызывают.
#[derive(Clone)]
pub struct ConnectionHandler {
    inner: Arc<Inner>,
}

impl ConnectionHandler {
    pub fn new(store: ChatStore, transport: Arc<dyn PushTransport>, config: &Config) -> Self {
        Self::build(store, transport, config, None)
    }

    /// Обработчик с чатом по умолчанию
    pub fn for_chat(
        store: ChatStore,
        transport: Arc<dyn PushTransport>,
        config: &Config,
        chat_id: impl Into<String>,
    ) -> Self {
        Self::build(store, transport, config, Some(chat_id.into()))
    }

    fn build(
        store: ChatStore,
        transport: Arc<dyn PushTransport>,
        config: &Config,
        default_chat_id: Option<String>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                transport,
                ws_base: config.ws_base.clone(),
                default_chat_id,
                session: Mutex::new(Session {
                    state: ConnectionState::Disconnected,
                    policy: config.reconnect_policy(),
                    chat_id: None,
                    outbound: None,
                    shutdown: None,
                    task: None,
                }),
            }),
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.inner.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: ConnectionState) {
        self.session().state = state;
    }

    // === Состояние ===

    pub fn state(&self) -> ConnectionState {
        self.session().state
    }

    /// Чат, к которому относится последняя сессия
    pub fn chat_id(&self) -> Option<String> {
        self.session().chat_id.clone()
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.session().policy.attempts()
    }

    /// Флаг соединения из стора
    pub fn is_connected(&self) -> bool {
        self.inner.store.is_connected()
    }

    pub fn store(&self) -> &ChatStore {
        &self.inner.store
    }

    // === Управление соединением ===

    /// Явный аргумент, иначе чат по умолчанию, иначе текущий чат стора
    fn resolve_chat_id(&self, target: Option<&str>) -> Option<String> {
        target
            .map(str::to_string)
            .or_else(|| self.inner.default_chat_id.clone())
            .or_else(|| self.inner.store.current_chat_id())
    }

    /// Подключиться к push-каналу чата.
    ///
    /// Предыдущая сессия этого обработчика закрывается. Без чата или без
    /// tokio рантайма вызов только пишет в лог.
    pub fn connect(&self, target_chat_id: Option<&str>) {
        let Some(chat_id) = self.resolve_chat_id(target_chat_id) else {
            warn!("No chat ID provided for push channel connection");
            return;
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            error!(chat_id, "Cannot open push channel outside of an async runtime");
            return;
        };

        self.stop_session();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        {
            let mut session = self.session();
            session.state = ConnectionState::Connecting;
            session.chat_id = Some(chat_id.clone());
            session.shutdown = Some(shutdown_tx);
        }

        let handler = self.clone();
        let task = runtime.spawn(async move { handler.run(chat_id, shutdown_rx).await });
        self.session().task = Some(task);
    }

    /// Закрыть соединение кодом 1000; переподключения не будет
    pub fn disconnect(&self) {
        if self.stop_session() {
            self.set_state(ConnectionState::Closed);
            self.inner.store.set_connection_status(false);
            info!("Push channel closed by client");
        }
    }

    /// Отправить close-фрейм, остановить задачу сессии и забыть её.
    /// `true`, если было что останавливать.
    fn stop_session(&self) -> bool {
        let mut session = self.session();
        let mut stopped = false;

        if let Some(outbound) = session.outbound.take() {
            let _ = outbound.send(OutboundFrame::Close {
                code: NORMAL_CLOSURE,
                reason: DISCONNECT_REASON.to_string(),
            });
            stopped = true;
        }

        if let Some(shutdown) = session.shutdown.take() {
            let _ = shutdown.send(true);
            stopped = true;
        }

        session.task.take();
        stopped
    }

    async fn run(self, chat_id: String, mut shutdown: watch::Receiver<bool>) {
        let url = channel_url(&self.inner.ws_base, &chat_id);

        loop {
            self.set_state(ConnectionState::Connecting);
            debug!(chat_id, %url, "Opening push channel");

            let opened = tokio::select! {
                biased;
                _ = shutdown.changed() => return,
                opened = self.inner.transport.open(&url) => opened,
            };

            let (code, reason) = match opened {
                Ok(TransportChannel { outbound, inbound }) => {
                    self.handle_open(&chat_id, outbound);
                    match self.pump(inbound, &mut shutdown).await {
                        Some(close) => close,
                        None => return,
                    }
                }
                Err(e) => {
                    self.handle_error(&e.to_string());
                    (ABNORMAL_CLOSURE, e.to_string())
                }
            };

            let Some(delay) = self.handle_close(code, &reason) else {
                return;
            };

            tokio::select! {
                biased;
                _ = shutdown.changed() => return,
                _ = tokio::time::sleep(delay) => {}
            }

            info!(
                chat_id,
                attempt = self.reconnect_attempts(),
                "Attempting to reconnect push channel"
            );
        }
    }

    /// Читать фреймы до закрытия. `None` означает остановку по `disconnect()`.
    async fn pump(
        &self,
        mut inbound: UnboundedReceiver<InboundFrame>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Option<(u16, String)> {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => return None,
                frame = inbound.recv() => match frame {
                    Some(InboundFrame::Text(text)) => self.handle_inbound(&text),
                    Some(InboundFrame::Error(err)) => self.handle_error(&err),
                    Some(InboundFrame::Closed { code, reason }) => return Some((code, reason)),
                    None => return Some((ABNORMAL_CLOSURE, "transport dropped".to_string())),
                },
            }
        }
    }

    // === События соединения ===

    /// Соединение открыто
    pub fn handle_open(&self, chat_id: &str, outbound: UnboundedSender<OutboundFrame>) {
        {
            let mut session = self.session();
            session.state = ConnectionState::Connected;
            session.outbound = Some(outbound);
            session.policy.reset();
        }
        self.inner.store.set_connection_status(true);
        info!(chat_id, "Push channel connected");
    }

    /// Текстовый фрейм от сервера. Битые фреймы только логируются.
    pub fn handle_inbound(&self, text: &str) {
        match decode_server_event(text) {
            Ok(event) => self.dispatch(event),
            Err(e) => error!(error = %e, "Failed to parse push frame"),
        }
    }

    pub fn dispatch(&self, event: ServerEvent) {
        let store = &self.inner.store;

        match event {
            ServerEvent::MessageReceived(data) => {
                let current = store.current_chat_id();
                match data.into_message(current.as_deref()) {
                    Some(message) => {
                        store.add_message(message);
                    }
                    None => warn!("message_received without chat id and no current chat, dropping"),
                }
            }
            ServerEvent::PresenceUpdated(presence) => {
                // Индикатор ставится в текущий чат стора, а не в чат события
                match store.current_chat_id() {
                    Some(chat_id) => {
                        store.update_typing_status(&chat_id, &presence.user_id, presence.is_typing())
                    }
                    None => debug!(user_id = %presence.user_id, "presence_updated without current chat"),
                }
            }
            ServerEvent::ChatRead(data) => info!(%data, "Chat read"),
            ServerEvent::Unknown { kind, .. } => debug!(kind, "Unknown push event"),
        }
    }

    /// Соединение закрыто. Возвращает задержку перед переподключением, если оно нужно.
    pub fn handle_close(&self, code: u16, reason: &str) -> Option<Duration> {
        self.inner.store.set_connection_status(false);
        info!(code, reason, "Push channel disconnected");

        let mut session = self.session();
        session.outbound = None;

        if code == NORMAL_CLOSURE {
            session.state = ConnectionState::Closed;
            return None;
        }

        match session.policy.next_delay() {
            Some(delay) => {
                session.state = ConnectionState::Reconnecting;
                info!(
                    attempt = session.policy.attempts(),
                    max = session.policy.max_attempts(),
                    delay_ms = delay.as_millis() as u64,
                    "Scheduling push channel reconnect"
                );
                Some(delay)
            }
            None => {
                session.state = ConnectionState::Closed;
                warn!(
                    attempts = session.policy.attempts(),
                    "Reconnect attempts exhausted, giving up"
                );
                None
            }
        }
    }

    /// Ошибка транспорта. Переподключение решает `handle_close`.
    pub fn handle_error(&self, err: &str) {
        error!(error = err, "Push channel error");
        self.inner.store.set_connection_status(false);
    }

    // === Исходящие ===

    /// Отправить событие, если канал открыт; иначе событие теряется
    pub fn send_message(&self, event: &ClientEvent) {
        let session = self.session();

        let Some(outbound) = session
            .outbound
            .as_ref()
            .filter(|_| session.state == ConnectionState::Connected)
        else {
            warn!("Push channel is not connected, dropping outbound event");
            return;
        };

        match encode_client_event(event) {
            Ok(text) => {
                if outbound.send(OutboundFrame::Text(text)).is_err() {
                    warn!("Push channel writer is gone, dropping outbound event");
                }
            }
            Err(e) => error!(error = %e, "Failed to encode outbound event"),
        }
    }

    pub fn send_typing_status(&self, chat_id: &str, is_typing: bool) {
        let Some(user) = self.inner.store.logged_in_user() else {
            warn!(chat_id, "No logged-in user to attribute typing status to");
            return;
        };

        self.send_message(&ClientEvent::Typing(TypingData {
            chat_id: chat_id.to_string(),
            user_id: user.id,
            is_typing,
        }));
    }

    /// Подключиться сейчас и отключиться, когда scope будет уничтожен
    pub fn scope(&self) -> ConnectionScope {
        ConnectionScope::open(self.clone())
    }
}

/// Соединение, привязанное к области видимости: открывается при создании,
/// закрывается в `Drop`.
pub struct ConnectionScope {
    handler: ConnectionHandler,
}

impl ConnectionScope {
    pub fn open(handler: ConnectionHandler) -> Self {
        handler.connect(None);
        Self { handler }
    }

    pub fn handler(&self) -> &ConnectionHandler {
        &self.handler
    }
}

impl Deref for ConnectionScope {
    type Target = ConnectionHandler;

    fn deref(&self) -> &Self::Target {
        &self.handler
    }
}

impl Drop for ConnectionScope {
    fn drop(&mut self) {
        self.handler.disconnect();
    }
}
