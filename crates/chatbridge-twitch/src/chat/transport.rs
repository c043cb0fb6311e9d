//! IRC over websocket, the way Twitch serves chat to browsers.
//!
//! Each [`ChatTransport::connect`] spawns one session task. The task performs
//! the login handshake, joins the configured channels once the server
//! welcomes it (`001`), answers `PING`s, and turns `PRIVMSG`s into
//! [`TransportEvent::Message`]. However the task ends (quit, server close,
//! `RECONNECT`, authentication failure, I/O error) it emits exactly one
//! [`TransportEvent::Disconnected`]. Reconnecting is left to the caller.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chatbridge_settings::ChatBridgeSettings;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::message::IrcMessage;
use super::{ChatMessage, ChatTransport, TransportEvent};
use crate::errors::TransportError;

/// Capacity of the transport event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Notices Twitch sends when the login handshake is rejected.
const AUTH_FAILURE_NOTICES: &[&str] = &["Login authentication failed", "Improperly formatted auth"];

/// Connection parameters for one chat identity.
#[derive(Clone)]
pub struct IrcConfig {
    /// Websocket URL (`wss://irc-ws.chat.twitch.tv:443`).
    pub url: String,
    /// Login used as the IRC nickname.
    pub login: String,
    /// Bearer token, sent as `PASS oauth:<token>`.
    pub token: String,
    /// Channels to join after the welcome.
    pub channels: Vec<String>,
}

impl IrcConfig {
    /// Config that joins the user's own channel.
    pub fn for_own_channel(
        settings: &ChatBridgeSettings,
        login: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        let login = login.into();
        Self {
            url: settings.endpoints.chat_url.clone(),
            channels: vec![login.clone()],
            login,
            token: token.into(),
        }
    }

    fn handshake(&self) -> [String; 3] {
        [
            "CAP REQ :twitch.tv/tags twitch.tv/commands".to_string(),
            format!("PASS oauth:{}", self.token),
            format!("NICK {}", self.login),
        ]
    }
}

impl std::fmt::Debug for IrcConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IrcConfig")
            .field("url", &self.url)
            .field("login", &self.login)
            .field("channels", &self.channels)
            .finish_non_exhaustive()
    }
}

/// Outgoing work for the session task.
enum Outgoing {
    Say { channel: String, message: String },
}

/// A running session task.
struct RunningSession {
    commands: mpsc::UnboundedSender<Outgoing>,
    cancel: CancellationToken,
    /// Set before the task emits `Disconnected`.
    ended: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl RunningSession {
    fn is_active(&self) -> bool {
        !self.ended.load(Ordering::Acquire) && !self.handle.is_finished()
    }
}

/// Twitch chat over websocket.
pub struct IrcTransport {
    config: Arc<IrcConfig>,
    events: mpsc::Sender<TransportEvent>,
    session: Mutex<Option<RunningSession>>,
}

impl IrcTransport {
    /// Create a transport and the receiver for its events.
    pub fn new(config: IrcConfig) -> (Self, mpsc::Receiver<TransportEvent>) {
        let (events, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let transport = Self {
            config: Arc::new(config),
            events,
            session: Mutex::new(None),
        };
        (transport, rx)
    }
}

impl ChatTransport for IrcTransport {
    fn connect(&self) -> Result<(), TransportError> {
        let mut slot = self.session.lock();
        if slot.as_ref().is_some_and(RunningSession::is_active) {
            debug!("chat session already running");
            return Ok(());
        }

        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| TransportError::NoRuntime)?;
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let ended = Arc::new(AtomicBool::new(false));
        let handle = runtime.spawn(run_session(
            Arc::clone(&self.config),
            self.events.clone(),
            commands_rx,
            cancel.clone(),
            Arc::clone(&ended),
        ));

        *slot = Some(RunningSession {
            commands,
            cancel,
            ended,
            handle,
        });
        Ok(())
    }

    fn quit(&self) {
        if let Some(session) = self.session.lock().take() {
            session.cancel.cancel();
        }
    }

    fn say(&self, channel: &str, message: &str) -> Result<(), TransportError> {
        let slot = self.session.lock();
        let session = slot.as_ref().ok_or(TransportError::NotRunning)?;
        session
            .commands
            .send(Outgoing::Say {
                channel: channel.to_string(),
                message: message.to_string(),
            })
            .map_err(|_| TransportError::NotRunning)
    }
}

impl Drop for IrcTransport {
    fn drop(&mut self) {
        self.quit();
    }
}

#[tracing::instrument(skip_all, name = "chat_session", fields(login = %config.login))]
async fn run_session(
    config: Arc<IrcConfig>,
    events: mpsc::Sender<TransportEvent>,
    mut commands: mpsc::UnboundedReceiver<Outgoing>,
    cancel: CancellationToken,
    ended: Arc<AtomicBool>,
) {
    match session_loop(&config, &events, &mut commands, &cancel).await {
        Ok(()) => info!("chat session closed"),
        Err(e) => warn!(error = %e, "chat session ended"),
    }
    ended.store(true, Ordering::Release);
    let _ = events.send(TransportEvent::Disconnected).await;
}

async fn session_loop(
    config: &IrcConfig,
    events: &mpsc::Sender<TransportEvent>,
    commands: &mut mpsc::UnboundedReceiver<Outgoing>,
    cancel: &CancellationToken,
) -> Result<(), TransportError> {
    let (ws, _) = tokio::select! {
        () = cancel.cancelled() => return Ok(()),
        result = connect_async(config.url.as_str()) => result.map_err(ws_error)?,
    };
    let (mut sink, mut stream) = ws.split();

    for line in config.handshake() {
        sink.send(Message::text(line)).await.map_err(ws_error)?;
    }

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                return Ok(());
            }
            Some(command) = commands.recv() => match command {
                Outgoing::Say { channel, message } => {
                    let line = format!("PRIVMSG #{channel} :{}", single_line(&message));
                    sink.send(Message::text(line)).await.map_err(ws_error)?;
                }
            },
            frame = stream.next() => {
                let Some(frame) = frame else {
                    return Ok(());
                };
                match frame.map_err(ws_error)? {
                    Message::Text(text) => {
                        for line in text.as_str().lines() {
                            let Some(msg) = IrcMessage::parse(line) else {
                                continue;
                            };
                            match msg.command.as_str() {
                                "PING" => {
                                    let pong = format!("PONG :{}", msg.trailing().unwrap_or("tmi.twitch.tv"));
                                    sink.send(Message::text(pong)).await.map_err(ws_error)?;
                                }
                                "001" => {
                                    for channel in &config.channels {
                                        sink.send(Message::text(format!("JOIN #{channel}")))
                                            .await
                                            .map_err(ws_error)?;
                                    }
                                    info!(channels = ?config.channels, "chat connected");
                                    let _ = events.send(TransportEvent::Connected).await;
                                }
                                "PRIVMSG" => {
                                    if let Some(chat) = ChatMessage::from_irc(&msg) {
                                        let _ = events.send(TransportEvent::Message(chat)).await;
                                    }
                                }
                                "NOTICE" => {
                                    let text = msg.trailing().unwrap_or_default();
                                    if AUTH_FAILURE_NOTICES.iter().any(|n| text.contains(n)) {
                                        return Err(TransportError::AuthFailed(text.to_string()));
                                    }
                                    debug!(notice = text, "chat notice");
                                }
                                "RECONNECT" => {
                                    info!("server requested reconnect");
                                    return Ok(());
                                }
                                other => trace!(command = other, "ignored chat line"),
                            }
                        }
                    }
                    Message::Close(_) => return Ok(()),
                    _ => {}
                }
            }
        }
    }
}

/// Line breaks would end the `PRIVMSG` early and start a new command.
fn single_line(message: &str) -> String {
    message.replace(['\r', '\n'], " ")
}

#[allow(clippy::needless_pass_by_value)]
fn ws_error(e: tokio_tungstenite::tungstenite::Error) -> TransportError {
    TransportError::WebSocket(e.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    type ServerWs = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

    fn config(url: String) -> IrcConfig {
        IrcConfig {
            url,
            login: "owner".to_string(),
            token: "secret".to_string(),
            channels: vec!["owner".to_string()],
        }
    }

    async fn listen() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        (listener, url)
    }

    async fn accept(listener: &TcpListener) -> ServerWs {
        let (tcp, _) = listener.accept().await.unwrap();
        accept_async(tcp).await.unwrap()
    }

    async fn next_text(ws: &mut ServerWs) -> String {
        loop {
            match ws.next().await.unwrap().unwrap() {
                Message::Text(t) => return t.as_str().to_string(),
                Message::Close(_) => return "<close>".to_string(),
                _ => {}
            }
        }
    }

    async fn next_event(rx: &mut mpsc::Receiver<TransportEvent>) -> TransportEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for transport event")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn handshake_join_message_and_quit() {
        let (listener, url) = listen().await;
        let (transport, mut events) = IrcTransport::new(config(url));
        transport.connect().unwrap();

        let mut server = accept(&listener).await;
        assert_eq!(next_text(&mut server).await, "CAP REQ :twitch.tv/tags twitch.tv/commands");
        assert_eq!(next_text(&mut server).await, "PASS oauth:secret");
        assert_eq!(next_text(&mut server).await, "NICK owner");

        server
            .send(Message::text(":tmi.twitch.tv 001 owner :Welcome, GLHF!\r\n"))
            .await
            .unwrap();
        assert_eq!(next_text(&mut server).await, "JOIN #owner");
        assert_eq!(next_event(&mut events).await, TransportEvent::Connected);

        server
            .send(Message::text(
                "@display-name=Owner;user-id=42 :owner!owner@owner.tmi.twitch.tv PRIVMSG #owner :hello chat\r\n",
            ))
            .await
            .unwrap();
        match next_event(&mut events).await {
            TransportEvent::Message(msg) => {
                assert_eq!(msg.user_id, "42");
                assert_eq!(msg.text, "hello chat");
            }
            other => panic!("expected message, got {other:?}"),
        }

        transport.say("owner", "from the app").unwrap();
        assert_eq!(next_text(&mut server).await, "PRIVMSG #owner :from the app");

        transport.quit();
        assert_eq!(next_event(&mut events).await, TransportEvent::Disconnected);
        assert_eq!(next_text(&mut server).await, "<close>");
    }

    #[tokio::test]
    async fn line_breaks_stay_inside_one_privmsg() {
        let (listener, url) = listen().await;
        let (transport, _events) = IrcTransport::new(config(url));
        transport.connect().unwrap();

        let mut server = accept(&listener).await;
        for _ in 0..3 {
            let _ = next_text(&mut server).await;
        }
        transport.say("owner", "hi\r\nPART #owner").unwrap();

        let frame = next_text(&mut server).await;
        assert_eq!(frame.lines().count(), 1);
        assert_eq!(frame, "PRIVMSG #owner :hi  PART #owner");
        transport.quit();
    }

    #[test]
    fn single_line_replaces_breaks() {
        assert_eq!(single_line("a\nb\rc"), "a b c");
        assert_eq!(single_line("plain"), "plain");
    }

    #[tokio::test]
    async fn connect_right_after_disconnect_starts_new_session() {
        let (listener, url) = listen().await;
        let (transport, mut events) = IrcTransport::new(config(url));
        transport.connect().unwrap();

        let mut server = accept(&listener).await;
        server.close(None).await.unwrap();
        assert_eq!(next_event(&mut events).await, TransportEvent::Disconnected);

        transport.connect().unwrap();
        let mut second = tokio::time::timeout(Duration::from_secs(5), accept(&listener))
            .await
            .expect("no second connection");
        assert_eq!(next_text(&mut second).await, "CAP REQ :twitch.tv/tags twitch.tv/commands");
        transport.quit();
    }

    #[tokio::test]
    async fn answers_ping() {
        let (listener, url) = listen().await;
        let (transport, _events) = IrcTransport::new(config(url));
        transport.connect().unwrap();

        let mut server = accept(&listener).await;
        for _ in 0..3 {
            let _ = next_text(&mut server).await;
        }
        server.send(Message::text("PING :tmi.twitch.tv\r\n")).await.unwrap();
        assert_eq!(next_text(&mut server).await, "PONG :tmi.twitch.tv");
        transport.quit();
    }

    #[tokio::test]
    async fn auth_failure_notice_disconnects() {
        let (listener, url) = listen().await;
        let (transport, mut events) = IrcTransport::new(config(url));
        transport.connect().unwrap();

        let mut server = accept(&listener).await;
        for _ in 0..3 {
            let _ = next_text(&mut server).await;
        }
        server
            .send(Message::text(":tmi.twitch.tv NOTICE * :Login authentication failed\r\n"))
            .await
            .unwrap();

        assert_eq!(next_event(&mut events).await, TransportEvent::Disconnected);
    }

    #[tokio::test]
    async fn server_close_disconnects() {
        let (listener, url) = listen().await;
        let (transport, mut events) = IrcTransport::new(config(url));
        transport.connect().unwrap();

        let mut server = accept(&listener).await;
        server.close(None).await.unwrap();

        assert_eq!(next_event(&mut events).await, TransportEvent::Disconnected);
    }

    #[tokio::test]
    async fn unreachable_server_disconnects() {
        let (listener, url) = listen().await;
        drop(listener);
        let (transport, mut events) = IrcTransport::new(config(url));
        transport.connect().unwrap();

        assert_eq!(next_event(&mut events).await, TransportEvent::Disconnected);
    }

    #[test]
    fn say_without_session_fails() {
        let (transport, _events) = IrcTransport::new(config("ws://127.0.0.1:1".into()));
        assert_eq!(
            transport.say("owner", "hi"),
            Err(TransportError::NotRunning)
        );
    }

    #[test]
    fn connect_outside_runtime_fails() {
        let (transport, _events) = IrcTransport::new(config("ws://127.0.0.1:1".into()));
        assert_eq!(transport.connect(), Err(TransportError::NoRuntime));
    }

    #[test]
    fn debug_hides_token() {
        let debug = format!("{:?}", config("ws://x".into()));
        assert!(!debug.contains("secret"));
    }
}
