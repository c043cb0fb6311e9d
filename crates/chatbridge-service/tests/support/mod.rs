//! Fakes shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chatbridge_core::InMemoryTextBus;
use chatbridge_service::{ClientFactory, Session, SessionManager};
use chatbridge_settings::{ChatBridgeSettings, SettingsStore, TwitchSettings};
use chatbridge_twitch::{
    ChatMessage, ChatTransport, EmoteMap, EmoteProvider, Identity, TransportError,
    TransportEvent, TwitchApi, TwitchError,
};
use parking_lot::Mutex;
use tokio::sync::{Semaphore, mpsc};

pub const OWNER_ID: &str = "42";
pub const OWNER_LOGIN: &str = "owner";

pub fn emotes(pairs: &[(&str, &str)]) -> EmoteMap {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

// ── platform API ──

pub struct FakeApi {
    pub fail_identity: AtomicBool,
    pub gated: AtomicBool,
    pub gate: Semaphore,
    pub identity_calls: AtomicUsize,
    pub live: AtomicBool,
    pub tokens: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            fail_identity: AtomicBool::new(false),
            gated: AtomicBool::new(false),
            gate: Semaphore::new(0),
            identity_calls: AtomicUsize::new(0),
            live: AtomicBool::new(false),
            tokens: Mutex::new(Vec::new()),
        }
    }

    pub fn identity_calls(&self) -> usize {
        self.identity_calls.load(Ordering::SeqCst)
    }

    /// Let `n` gated identity lookups finish.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }
}

#[async_trait]
impl TwitchApi for FakeApi {
    async fn get_identity(&self) -> Result<Identity, TwitchError> {
        let _ = self.identity_calls.fetch_add(1, Ordering::SeqCst);
        if self.gated.load(Ordering::SeqCst) {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|_| TwitchError::InvalidResponse("gate closed".into()))?;
            permit.forget();
        }
        if self.fail_identity.load(Ordering::SeqCst) {
            return Err(TwitchError::Unauthorized("invalid oauth token".into()));
        }
        Ok(Identity {
            id: OWNER_ID.into(),
            login: OWNER_LOGIN.into(),
            display_name: "Owner".into(),
            avatar_url: "https://img/owner.png".into(),
        })
    }

    async fn channel_emotes(&self, _broadcaster_id: &str) -> Result<EmoteMap, TwitchError> {
        Ok(emotes(&[("ownHype", "twitch-channel"), ("shared", "twitch-channel")]))
    }

    async fn global_emotes(&self) -> Result<EmoteMap, TwitchError> {
        Ok(emotes(&[("Kappa", "twitch-global"), ("shared", "twitch-global")]))
    }

    async fn is_live(&self, _login: &str) -> Result<bool, TwitchError> {
        Ok(self.live.load(Ordering::SeqCst))
    }
}

// ── emote providers ──

pub struct StaticProvider {
    pub name: &'static str,
    pub global: EmoteMap,
    pub channel: EmoteMap,
    pub fail: bool,
}

#[async_trait]
impl EmoteProvider for StaticProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self, channel_id: Option<&str>) -> Result<EmoteMap, TwitchError> {
        if self.fail {
            return Err(TwitchError::Api {
                status: 503,
                message: "unavailable".into(),
            });
        }
        Ok(match channel_id {
            Some(_) => self.channel.clone(),
            None => self.global.clone(),
        })
    }
}

/// Global fetches return at once; channel fetches wait for [`release`].
///
/// [`release`]: GatedProvider::release
pub struct GatedProvider {
    pub channel_calls: AtomicUsize,
    pub gate: Semaphore,
}

impl GatedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            channel_calls: AtomicUsize::new(0),
            gate: Semaphore::new(0),
        })
    }

    pub fn channel_calls(&self) -> usize {
        self.channel_calls.load(Ordering::SeqCst)
    }

    pub fn release(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl EmoteProvider for GatedProvider {
    fn name(&self) -> &'static str {
        "gated"
    }

    async fn fetch(&self, channel_id: Option<&str>) -> Result<EmoteMap, TwitchError> {
        if channel_id.is_none() {
            return Ok(emotes(&[("slowGlobal", "gated-global")]));
        }
        let _ = self.channel_calls.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| TwitchError::InvalidResponse("gate closed".into()))?;
        permit.forget();
        Ok(emotes(&[("slowChannel", "gated-channel")]))
    }
}

// ── chat transport ──

pub struct FakeTransport {
    pub events: mpsc::Sender<TransportEvent>,
    pub connects: AtomicUsize,
    pub quits: AtomicUsize,
    pub auto_connect: bool,
    pub said: Mutex<Vec<(String, String)>>,
}

impl FakeTransport {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn said(&self) -> Vec<String> {
        self.said.lock().iter().map(|(_, m)| m.clone()).collect()
    }

    pub async fn deliver(&self, user_id: &str, text: &str) {
        let message = ChatMessage {
            channel: OWNER_LOGIN.into(),
            user_id: user_id.into(),
            login: if user_id == OWNER_ID { OWNER_LOGIN } else { "viewer" }.into(),
            display_name: "Someone".into(),
            text: text.into(),
        };
        self.events
            .send(TransportEvent::Message(message))
            .await
            .expect("chat pump gone");
    }
}

impl ChatTransport for FakeTransport {
    fn connect(&self) -> Result<(), TransportError> {
        let _ = self.connects.fetch_add(1, Ordering::SeqCst);
        if self.auto_connect {
            let _ = self.events.try_send(TransportEvent::Connected);
        }
        Ok(())
    }

    fn quit(&self) {
        let _ = self.quits.fetch_add(1, Ordering::SeqCst);
        let _ = self.events.try_send(TransportEvent::Disconnected);
    }

    fn say(&self, channel: &str, message: &str) -> Result<(), TransportError> {
        self.said.lock().push((channel.to_string(), message.to_string()));
        Ok(())
    }
}

// ── factory ──

pub struct FakeFactory {
    pub api: Arc<FakeApi>,
    pub providers: Vec<Arc<dyn EmoteProvider>>,
    pub auto_connect: bool,
    pub transports: Mutex<Vec<Arc<FakeTransport>>>,
}

impl FakeFactory {
    pub fn transport_count(&self) -> usize {
        self.transports.lock().len()
    }

    pub fn latest_transport(&self) -> Arc<FakeTransport> {
        self.transports
            .lock()
            .last()
            .cloned()
            .expect("no transport built yet")
    }
}

impl ClientFactory for FakeFactory {
    fn api(&self, token: &str) -> Arc<dyn TwitchApi> {
        self.api.tokens.lock().push(token.to_string());
        self.api.clone()
    }

    fn chat_transport(
        &self,
        _session: &Session,
    ) -> (Arc<dyn ChatTransport>, mpsc::Receiver<TransportEvent>) {
        let (events, rx) = mpsc::channel(64);
        let transport = Arc::new(FakeTransport {
            events,
            connects: AtomicUsize::new(0),
            quits: AtomicUsize::new(0),
            auto_connect: self.auto_connect,
            said: Mutex::new(Vec::new()),
        });
        self.transports.lock().push(transport.clone());
        (transport, rx)
    }

    fn emote_providers(&self) -> Vec<Arc<dyn EmoteProvider>> {
        self.providers.clone()
    }
}

pub fn default_providers() -> Vec<Arc<dyn EmoteProvider>> {
    vec![
        Arc::new(StaticProvider {
            name: "ffz",
            global: emotes(&[("shared", "ffz-global"), ("ZreknarF", "ffz-global")]),
            channel: emotes(&[("shared", "ffz-channel")]),
            fail: false,
        }),
        Arc::new(StaticProvider {
            name: "bttv",
            global: emotes(&[("catJAM", "bttv-global")]),
            channel: emotes(&[("shared", "bttv-channel"), ("catJAM", "bttv-channel")]),
            fail: false,
        }),
    ]
}

// ── harness ──

pub struct Harness {
    pub settings: Arc<SettingsStore>,
    pub api: Arc<FakeApi>,
    pub factory: Arc<FakeFactory>,
    pub manager: Arc<SessionManager>,
    pub bus: Arc<InMemoryTextBus>,
}

pub fn harness(configure: impl FnOnce(&mut TwitchSettings)) -> Harness {
    harness_with(default_providers(), configure)
}

pub fn harness_with(
    providers: Vec<Arc<dyn EmoteProvider>>,
    configure: impl FnOnce(&mut TwitchSettings),
) -> Harness {
    let mut settings = ChatBridgeSettings::default();
    settings.twitch.client_id = "test-client".into();
    settings.twitch.live_check_interval_ms = 20;
    configure(&mut settings.twitch);

    let settings = Arc::new(SettingsStore::new(settings));
    let api = Arc::new(FakeApi::new());
    let factory = Arc::new(FakeFactory {
        api: api.clone(),
        providers,
        auto_connect: true,
        transports: Mutex::new(Vec::new()),
    });
    let manager = Arc::new(SessionManager::new(settings.clone(), factory.clone()));
    Harness {
        settings,
        api,
        factory,
        manager,
        bus: Arc::new(InMemoryTextBus::new()),
    }
}

/// Poll `condition` until it holds or five seconds pass.
pub async fn wait_until(what: &str, condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Give spawned tasks time to react to something that should not happen.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
