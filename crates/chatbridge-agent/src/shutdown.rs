//! Background relay tasks and their shared cancellation token.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Relay tasks that stop together.
///
/// Each task receives a child of one token. [`RelayTasks::drain`] cancels
/// it and waits a bounded time for the tasks to return.
#[derive(Default)]
pub struct RelayTasks {
    token: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl RelayTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for a task about to be spawned.
    pub fn token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Wait for `handle` during [`RelayTasks::drain`].
    pub fn track(&mut self, handle: JoinHandle<()>) {
        self.handles.push(handle);
    }

    /// Cancel every task and wait up to `timeout`.
    ///
    /// Returns `false` if some task was still running when time ran out.
    pub async fn drain(self, timeout: Duration) -> bool {
        self.token.cancel();
        info!(tasks = self.handles.len(), ?timeout, "stopping relay tasks");

        let finished = tokio::time::timeout(timeout, futures::future::join_all(self.handles))
            .await
            .is_ok();
        if !finished {
            warn!(?timeout, "relay tasks did not stop in time");
        }
        finished
    }
}
