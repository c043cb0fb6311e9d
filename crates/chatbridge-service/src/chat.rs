//! Chat connection state machine.
//!
//! A [`ChatConnection`] wraps one transport for one session. The transport
//! reports everything on a single event channel; a pump task folds those
//! events through [`transition`] into the shared [`ConnectionStatus`] and
//! forwards the session owner's own messages.

use std::fmt;
use std::sync::Arc;

use chatbridge_twitch::{ChatMessage, ChatTransport, TransportEvent};
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::session::Session;

/// Chat transport state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    /// No connection (initial and terminal).
    #[default]
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Joined and able to send.
    Connected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
        }
    }
}

/// Status after `event` arrives in `current`.
///
/// Messages never change the status. `Connecting` is only ever entered
/// through [`ChatConnection::open`], never through an event.
pub fn transition(current: ConnectionStatus, event: &TransportEvent) -> ConnectionStatus {
    match event {
        TransportEvent::Connected => ConnectionStatus::Connected,
        TransportEvent::Disconnected => ConnectionStatus::Disconnected,
        TransportEvent::Message(_) => current,
    }
}

/// One session's chat connection.
pub struct ChatConnection {
    transport: Arc<dyn ChatTransport>,
    channel: String,
    status: Arc<watch::Sender<ConnectionStatus>>,
    pump: CancellationToken,
}

impl ChatConnection {
    /// Bind `transport` to `session` and start consuming its events.
    ///
    /// Status changes go to `status`; messages written by the session owner
    /// go to `inbound`.
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        events: mpsc::Receiver<TransportEvent>,
        session: &Session,
        status: Arc<watch::Sender<ConnectionStatus>>,
        inbound: broadcast::Sender<ChatMessage>,
    ) -> Self {
        let pump = CancellationToken::new();
        drop(tokio::spawn(pump_events(
            events,
            session.user_id.clone(),
            Arc::clone(&status),
            inbound,
            pump.clone(),
        )));
        Self {
            transport,
            channel: session.login.clone(),
            status,
            pump,
        }
    }

    /// Current status.
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Start connecting unless already connecting or connected.
    pub fn open(&self) {
        let pump = &self.pump;
        let began = self.status.send_if_modified(|status| {
            if pump.is_cancelled() || *status != ConnectionStatus::Disconnected {
                return false;
            }
            *status = ConnectionStatus::Connecting;
            true
        });
        if !began {
            debug!(status = %self.status(), "chat open ignored");
            return;
        }

        info!(channel = %self.channel, "opening chat");
        if let Err(e) = self.transport.connect() {
            warn!(error = %e, "chat handshake could not start");
            self.apply(&TransportEvent::Disconnected);
        }
    }

    /// Ask the transport to close. The status follows through the
    /// transport's `Disconnected` event.
    pub fn close(&self) {
        info!(channel = %self.channel, "closing chat");
        self.transport.quit();
    }

    /// Post to the session's channel. Dropped unless connected.
    pub fn send(&self, message: &str) {
        if self.status() != ConnectionStatus::Connected || self.channel.is_empty() {
            debug!(status = %self.status(), "chat not connected, dropping message");
            return;
        }
        if let Err(e) = self.transport.say(&self.channel, message) {
            warn!(error = %e, "failed to send chat message");
        }
    }

    /// Close the transport and stop the pump. The status is `Disconnected`
    /// on return and this connection no longer touches it.
    pub fn shutdown(&self) {
        if self.pump.is_cancelled() {
            return;
        }
        self.pump.cancel();
        self.transport.quit();
        let _ = self.status.send_if_modified(|status| {
            std::mem::replace(status, ConnectionStatus::Disconnected)
                != ConnectionStatus::Disconnected
        });
    }

    fn apply(&self, event: &TransportEvent) {
        let _ = apply_event(&self.status, &self.pump, event);
    }
}

impl Drop for ChatConnection {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Fold `event` into `status` unless `pump` was cancelled. Returns whether
/// the status changed.
fn apply_event(
    status: &watch::Sender<ConnectionStatus>,
    pump: &CancellationToken,
    event: &TransportEvent,
) -> bool {
    status.send_if_modified(|current| {
        if pump.is_cancelled() {
            return false;
        }
        let next = transition(*current, event);
        if next == *current {
            return false;
        }
        debug!(from = %current, to = %next, "chat status");
        *current = next;
        true
    })
}

async fn pump_events(
    mut events: mpsc::Receiver<TransportEvent>,
    owner_id: String,
    status: Arc<watch::Sender<ConnectionStatus>>,
    inbound: broadcast::Sender<ChatMessage>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            () = cancel.cancelled() => break,
            event = events.recv() => event,
        };
        let Some(event) = event else {
            let _ = apply_event(&status, &cancel, &TransportEvent::Disconnected);
            break;
        };

        if let TransportEvent::Message(message) = &event {
            if !owner_id.is_empty() && message.user_id == owner_id {
                let _ = inbound.send(message.clone());
            } else {
                trace!(login = %message.login, "ignoring chat message from other user");
            }
        }
        let _ = apply_event(&status, &cancel, &event);
    }
    debug!("chat event pump stopped");
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
