//! Live status polling.
//!
//! [`LiveStatusPoller`] owns one cancellable periodic task. Every tick reads
//! the current session; without one it publishes `false` and skips the
//! network, otherwise it publishes whatever the probe says. Starting again
//! replaces the running task, so repeated connects never stack timers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chatbridge_twitch::TwitchApi;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::errors::ProbeError;
use crate::session::Session;

/// Shortest accepted polling interval.
const MIN_INTERVAL: Duration = Duration::from_millis(10);

/// Answers "is this channel broadcasting right now".
#[async_trait]
pub trait LiveProbe: Send + Sync {
    /// Probe `login` once.
    async fn is_live(&self, login: &str) -> Result<bool, ProbeError>;
}

/// [`LiveProbe`] backed by the platform API.
pub struct ApiLiveProbe {
    api: Arc<dyn TwitchApi>,
}

impl ApiLiveProbe {
    /// Wrap an API client.
    pub fn new(api: Arc<dyn TwitchApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl LiveProbe for ApiLiveProbe {
    async fn is_live(&self, login: &str) -> Result<bool, ProbeError> {
        Ok(self.api.is_live(login).await?)
    }
}

struct PollTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

struct PollerState {
    generation: u64,
    task: Option<PollTask>,
}

struct Shared {
    live: watch::Sender<bool>,
    state: Mutex<PollerState>,
}

/// Periodic live status check with a single published flag.
pub struct LiveStatusPoller {
    shared: Arc<Shared>,
}

impl LiveStatusPoller {
    /// Create a stopped poller reporting offline.
    pub fn new() -> Self {
        let (live, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                live,
                state: Mutex::new(PollerState {
                    generation: 0,
                    task: None,
                }),
            }),
        }
    }

    /// Start ticking every `interval`, replacing any running task.
    ///
    /// The first tick happens one full interval from now. Until then the
    /// channel is reported offline.
    pub fn start(
        &self,
        interval: Duration,
        identity: watch::Receiver<Option<Session>>,
        probe: Arc<dyn LiveProbe>,
    ) {
        let interval = interval.max(MIN_INTERVAL);
        let mut state = self.shared.state.lock();
        if let Some(old) = state.task.take() {
            debug!("replacing running live poller");
            old.cancel.cancel();
        }
        state.generation += 1;
        let _ = self.shared.live.send_if_modified(|live| std::mem::replace(live, false));

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(
            Arc::clone(&self.shared),
            state.generation,
            interval,
            identity,
            probe,
            cancel.clone(),
        ));
        state.task = Some(PollTask { cancel, handle });
        debug!(interval_ms = interval.as_millis(), "live poller started");
    }

    /// Stop ticking and report offline. Safe to call when stopped.
    pub fn stop(&self) {
        let mut state = self.shared.state.lock();
        state.generation += 1;
        if let Some(task) = state.task.take() {
            task.cancel.cancel();
            debug!("live poller stopped");
        }
        let _ = self.shared.live.send_if_modified(|live| std::mem::replace(live, false));
    }

    /// Whether a task is running.
    pub fn is_running(&self) -> bool {
        self.shared
            .state
            .lock()
            .task
            .as_ref()
            .is_some_and(|t| !t.handle.is_finished())
    }

    /// Last published live state.
    pub fn is_live(&self) -> bool {
        *self.shared.live.borrow()
    }

    /// Receiver notified whenever the live state flips.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shared.live.subscribe()
    }
}

impl Default for LiveStatusPoller {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LiveStatusPoller {
    fn drop(&mut self) {
        if let Some(task) = self.shared.state.lock().task.take() {
            task.cancel.cancel();
        }
    }
}

async fn run(
    shared: Arc<Shared>,
    generation: u64,
    interval: Duration,
    identity: watch::Receiver<Option<Session>>,
    probe: Arc<dyn LiveProbe>,
    cancel: CancellationToken,
) {
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let login = identity.borrow().as_ref().map(|s| s.login.clone());
        let live = match login {
            None => false,
            Some(login) => tokio::select! {
                () = cancel.cancelled() => break,
                result = probe.is_live(&login) => result.unwrap_or_else(|e| {
                    warn!(error = %e, "treating channel as offline");
                    false
                }),
            },
        };

        let state = shared.state.lock();
        if state.generation != generation {
            break;
        }
        if shared.live.send_if_modified(|current| std::mem::replace(current, live) != live) {
            debug!(live, "live state changed");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
