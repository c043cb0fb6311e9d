//! Authenticated session lifecycle.
//!
//! [`SessionManager`] is the only writer of the session. A connect attempt
//! runs in three phases: exchange the token for an identity, load every emote
//! source concurrently, then apply everything at once. Each attempt carries
//! an epoch; logout and newer connects bump it, and the apply phase checks it
//! under the same lock that guards the state, so results from an attempt
//! that was overtaken are dropped instead of resurrecting a session.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chatbridge_core::EmoteSpans;
use chatbridge_settings::SettingsStore;
use chatbridge_twitch::auth::{OAuthConfig, parse_auth_message};
use chatbridge_twitch::{ChatMessage, Identity, TwitchError};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::chat::{ChatConnection, ConnectionStatus};
use crate::clients::ClientFactory;
use crate::emotes::{EmoteRegistry, load_emotes};
use crate::errors::AuthError;
use crate::live::{ApiLiveProbe, LiveStatusPoller};

/// Capacity of the owner chat broadcast.
const INBOUND_CAPACITY: usize = 256;

/// The identity bound to the current token.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// Platform user ID.
    pub user_id: String,
    /// Login, which is also the chat channel name.
    pub login: String,
    /// Display name.
    pub display_name: String,
    /// Profile picture URL.
    pub avatar_url: String,
    /// Bearer token. Never logged.
    pub token: String,
    /// When the identity was confirmed.
    pub authenticated_at: DateTime<Utc>,
}

impl Session {
    /// Bind an identity to the token that produced it.
    pub fn from_identity(identity: Identity, token: String) -> Self {
        Self {
            user_id: identity.id,
            login: identity.login,
            display_name: identity.display_name,
            avatar_url: identity.avatar_url,
            token,
            authenticated_at: Utc::now(),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("login", &self.login)
            .field("display_name", &self.display_name)
            .field("avatar_url", &self.avatar_url)
            .field("token", &"<redacted>")
            .field("authenticated_at", &self.authenticated_at)
            .finish()
    }
}

struct State {
    epoch: u64,
    chat: Option<Arc<ChatConnection>>,
}

/// Owner of the authenticated lifecycle.
pub struct SessionManager {
    settings: Arc<SettingsStore>,
    factory: Arc<dyn ClientFactory>,
    emotes: EmoteRegistry,
    poller: LiveStatusPoller,
    session: watch::Sender<Option<Session>>,
    status: Arc<watch::Sender<ConnectionStatus>>,
    inbound: broadcast::Sender<ChatMessage>,
    state: Mutex<State>,
    connect_lock: tokio::sync::Mutex<()>,
}

impl SessionManager {
    /// Create a logged-out manager.
    pub fn new(settings: Arc<SettingsStore>, factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            settings,
            factory,
            emotes: EmoteRegistry::new(),
            poller: LiveStatusPoller::new(),
            session: watch::channel(None).0,
            status: Arc::new(watch::channel(ConnectionStatus::Disconnected).0),
            inbound: broadcast::channel(INBOUND_CAPACITY).0,
            state: Mutex::new(State {
                epoch: 0,
                chat: None,
            }),
            connect_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Exchange `token` for a session and bring everything up.
    ///
    /// An empty token is a no-op (`Ok(None)`). Emote sources that fail are
    /// skipped. If the identity lookup fails the manager logs out. If a
    /// logout or another connect overtakes this one, its results are
    /// discarded and [`AuthError::Superseded`] is returned.
    #[tracing::instrument(skip_all)]
    pub async fn connect(&self, token: &str) -> Result<Option<Session>, AuthError> {
        if token.is_empty() {
            debug!("no token, skipping connect");
            return Ok(None);
        }

        let epoch = self.begin_attempt();
        let _serial = self.connect_lock.lock().await;
        if !self.is_current(epoch) {
            return Err(AuthError::Superseded);
        }

        let api = self.factory.api(token);
        let identity = match api.get_identity().await {
            Ok(identity) => identity,
            Err(e) => {
                let err = AuthError::from(e);
                if !self.teardown(Some(epoch)) {
                    return Err(AuthError::Superseded);
                }
                self.forget_credentials();
                warn!(error = %err, "identity fetch failed, logged out");
                return Err(err);
            }
        };
        if !self.is_current(epoch) {
            return Err(AuthError::Superseded);
        }

        let session = Session::from_identity(identity, token.to_string());
        info!(login = %session.login, user_id = %session.user_id, "identity confirmed");

        let providers = self.factory.emote_providers();
        let staged = load_emotes(api.as_ref(), &providers, &session.user_id).await;
        let twitch = self.settings.snapshot().twitch;

        let replaced = {
            let mut state = self.state.lock();
            if state.epoch != epoch {
                return Err(AuthError::Superseded);
            }

            self.emotes.merge(staged);
            let (transport, events) = self.factory.chat_transport(&session);
            let chat = Arc::new(ChatConnection::new(
                transport,
                events,
                &session,
                Arc::clone(&self.status),
                self.inbound.clone(),
            ));
            let replaced = state.chat.replace(Arc::clone(&chat));
            if let Some(old) = &replaced {
                old.shutdown();
            }
            let _ = self.session.send_replace(Some(session.clone()));
            self.poller.start(
                Duration::from_millis(twitch.live_check_interval_ms),
                self.session.subscribe(),
                Arc::new(ApiLiveProbe::new(api)),
            );
            if twitch.chat_enable {
                chat.open();
            }
            replaced
        };
        drop(replaced);

        info!(
            login = %session.login,
            emotes = self.emotes.len(),
            "session connected"
        );
        Ok(Some(session))
    }

    /// Clear the token and the session, stop polling, and shut chat down.
    /// Safe to call when already logged out.
    pub fn logout(&self) {
        let _ = self.teardown(None);
        self.forget_credentials();
        info!("logged out");
    }

    /// Stop everything without touching the stored token.
    pub fn shutdown(&self) {
        let _ = self.teardown(None);
        debug!("session manager shut down");
    }

    /// Store a token from the OAuth hand-off and connect with it.
    pub async fn login(&self, token: &str) -> Result<Option<Session>, AuthError> {
        let _ = self.settings.set_token(token);
        self.connect(token).await
    }

    /// Handle a message posted by the OAuth redirect page.
    ///
    /// Anything that is not a token hand-off is ignored (`Ok(None)`).
    pub async fn handle_oauth_message(&self, message: &str) -> Result<Option<Session>, AuthError> {
        match parse_auth_message(message) {
            Some(token) => self.login(token).await,
            None => {
                debug!("ignoring non-auth message");
                Ok(None)
            }
        }
    }

    /// The URL the OAuth collaborator should open.
    pub fn authorization_url(&self) -> Result<String, TwitchError> {
        OAuthConfig::from_settings(&self.settings.snapshot()).authorization_url()
    }

    /// Connect with the stored token, then keep chat in step with the
    /// `chatEnable` setting until `cancel` fires.
    pub fn start(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut settings = manager.settings.subscribe();
            let (token, mut chat_enabled) = {
                let current = settings.borrow_and_update();
                (current.twitch.token.clone(), current.twitch.chat_enable)
            };

            tokio::select! {
                () = cancel.cancelled() => return,
                result = manager.connect(&token) => {
                    if let Err(e) = result {
                        warn!(error = %e, "startup connect failed");
                    }
                }
            }

            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    changed = settings.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let enabled = settings.borrow_and_update().twitch.chat_enable;
                        if enabled != chat_enabled {
                            chat_enabled = enabled;
                            if enabled {
                                manager.open_chat();
                            } else {
                                manager.close_chat();
                            }
                        }
                    }
                }
            }
            debug!("settings watcher stopped");
        })
    }

    /// Open chat for the current session, if any.
    pub fn open_chat(&self) {
        match self.chat() {
            Some(chat) => chat.open(),
            None => debug!("no session, chat stays closed"),
        }
    }

    /// Close chat for the current session, if any.
    pub fn close_chat(&self) {
        if let Some(chat) = self.chat() {
            chat.close();
        }
    }

    /// Post to the session's channel. Dropped when there is no session or
    /// chat is not connected.
    pub fn send_chat(&self, message: &str) {
        match self.chat() {
            Some(chat) => chat.send(message),
            None => debug!("no session, dropping chat message"),
        }
    }

    /// Current session.
    pub fn session(&self) -> Option<Session> {
        self.session.borrow().clone()
    }

    /// Receiver notified when the session appears or goes away.
    pub fn subscribe_session(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }

    /// Current chat status.
    pub fn chat_status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Receiver notified on chat status changes.
    pub fn subscribe_chat_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    /// Last polled live state.
    pub fn is_live(&self) -> bool {
        self.poller.is_live()
    }

    /// Receiver notified when the live state flips.
    pub fn subscribe_live(&self) -> watch::Receiver<bool> {
        self.poller.subscribe()
    }

    /// Chat messages written by the session owner.
    pub fn subscribe_chat(&self) -> broadcast::Receiver<ChatMessage> {
        self.inbound.subscribe()
    }

    /// Emote annotations for `sentence`.
    pub fn scan_emotes(&self, sentence: Option<&str>) -> EmoteSpans {
        self.emotes.scan(sentence)
    }

    /// Whether the live poller is running.
    pub fn is_polling(&self) -> bool {
        self.poller.is_running()
    }

    fn chat(&self) -> Option<Arc<ChatConnection>> {
        self.state.lock().chat.clone()
    }

    fn begin_attempt(&self) -> u64 {
        let mut state = self.state.lock();
        state.epoch += 1;
        state.epoch
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.state.lock().epoch == epoch
    }

    /// Drop the session and stop its components. With `expected`, only when
    /// that epoch is still current. Returns whether anything was done.
    fn teardown(&self, expected: Option<u64>) -> bool {
        let chat = {
            let mut state = self.state.lock();
            if expected.is_some_and(|epoch| epoch != state.epoch) {
                return false;
            }
            state.epoch += 1;
            let _ = self.session.send_replace(None);
            self.poller.stop();
            self.emotes.clear();
            state.chat.take()
        };
        if let Some(chat) = chat {
            chat.shutdown();
        }
        true
    }

    fn forget_credentials(&self) {
        if self.settings.set_token("") {
            debug!("stored token cleared");
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if let Some(chat) = self.state.get_mut().chat.take() {
            chat.shutdown();
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
