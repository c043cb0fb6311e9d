//! Text relay between the application's text bus and chat.
//!
//! Outbound, final text from the configured source (and optionally from the
//! text field) is posted to chat when [`should_post`] allows it. Inbound,
//! the session owner's own chat lines are published back onto the text
//! field, tagged [`CHAT_ORIGIN_TAG`] so they never loop back out.

use std::sync::Arc;

use chatbridge_core::{CHAT_ORIGIN_TAG, TextBus, TextEvent, TextEventSource};
use chatbridge_settings::{SettingsStore, TwitchSettings};
use chatbridge_twitch::ChatMessage;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::session::SessionManager;

/// The settings the relay reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BridgeFlags {
    /// Publish owner chat lines onto the bus.
    pub receive_enabled: bool,
    /// Post bus text to chat.
    pub post_enabled: bool,
    /// Post only while live.
    pub post_only_while_live: bool,
    /// Source whose events get posted.
    pub post_source: TextEventSource,
    /// Also post text-field input.
    pub post_input: bool,
}

impl BridgeFlags {
    /// Whether text-field events are posted in addition to
    /// [`post_source`](Self::post_source). When the post source already is
    /// the text field, the second subscription would post everything twice.
    pub fn posts_input(&self) -> bool {
        self.post_input && self.post_source != TextEventSource::Textfield
    }
}

impl From<&TwitchSettings> for BridgeFlags {
    fn from(settings: &TwitchSettings) -> Self {
        Self {
            receive_enabled: settings.chat_receive_enable,
            post_enabled: settings.chat_post_enable,
            post_only_while_live: settings.chat_post_live,
            post_source: settings.chat_post_source,
            post_input: settings.chat_post_input,
        }
    }
}

/// Whether `event` should be posted to chat.
pub fn should_post(flags: &BridgeFlags, event: &TextEvent, live: bool) -> bool {
    flags.post_enabled
        && event.is_final()
        && !event.value.is_empty()
        && !event.is_from_chat()
        && (!flags.post_only_while_live || live)
}

/// The bus event for an owner chat line.
pub fn inbound_event(message: &ChatMessage, session: &SessionManager) -> TextEvent {
    TextEvent::final_text(message.text.clone())
        .with_origin(CHAT_ORIGIN_TAG)
        .with_emotes(session.scan_emotes(Some(&message.text)))
}

/// Relay task between the bus and the session's chat.
pub struct TextBridge {
    bus: Arc<dyn TextBus>,
    session: Arc<SessionManager>,
    settings: Arc<SettingsStore>,
}

impl TextBridge {
    /// Create a relay.
    pub fn new(
        bus: Arc<dyn TextBus>,
        session: Arc<SessionManager>,
        settings: Arc<SettingsStore>,
    ) -> Self {
        Self {
            bus,
            session,
            settings,
        }
    }

    /// Run until `cancel` fires.
    ///
    /// Subscriptions are taken before this returns, so events published
    /// afterwards are seen.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        let mut settings = self.settings.subscribe();
        let mut flags = BridgeFlags::from(&settings.borrow_and_update().twitch);
        let mut source = self.bus.subscribe(flags.post_source);
        let mut input = self.bus.subscribe(TextEventSource::Textfield);
        let mut chat = self.session.subscribe_chat();

        tokio::spawn(async move {
            debug!(?flags, "text bridge started");
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    changed = settings.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let next = BridgeFlags::from(&settings.borrow_and_update().twitch);
                        if next.post_source != flags.post_source {
                            debug!(source = %next.post_source, "post source changed");
                            source = self.bus.subscribe(next.post_source);
                        }
                        flags = next;
                    }
                    event = source.recv() => match event {
                        Ok(event) => self.outbound(&flags, &event),
                        Err(RecvError::Lagged(skipped)) => warn!(skipped, "post source lagged"),
                        Err(RecvError::Closed) => break,
                    },
                    event = input.recv() => match event {
                        Ok(event) if flags.posts_input() => self.outbound(&flags, &event),
                        Ok(_) => {}
                        Err(RecvError::Lagged(skipped)) => warn!(skipped, "text field lagged"),
                        Err(RecvError::Closed) => break,
                    },
                    message = chat.recv() => match message {
                        Ok(message) => self.inbound(&flags, &message),
                        Err(RecvError::Lagged(skipped)) => warn!(skipped, "chat inbound lagged"),
                        Err(RecvError::Closed) => break,
                    },
                }
            }
            debug!("text bridge stopped");
        })
    }

    fn outbound(&self, flags: &BridgeFlags, event: &TextEvent) {
        if should_post(flags, event, self.session.is_live()) {
            self.session.send_chat(&event.value);
        } else {
            trace!(kind = ?event.kind, "not posting");
        }
    }

    fn inbound(&self, flags: &BridgeFlags, message: &ChatMessage) {
        if !flags.receive_enabled {
            return;
        }
        self.bus
            .publish(TextEventSource::Textfield, inbound_event(message, &self.session));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
