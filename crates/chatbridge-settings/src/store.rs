//! Reactive settings store.
//!
//! The host application owns configuration and validates it; chatbridge only
//! reads it and reacts to value changes. [`SettingsStore`] holds the current
//! [`ChatBridgeSettings`] in a `watch` channel so every component can take a
//! cheap snapshot or await the next change.

use std::path::PathBuf;

use tokio::sync::watch;

use crate::loader::save_settings_to_path;
use crate::types::ChatBridgeSettings;

/// Shared, observable settings.
pub struct SettingsStore {
    tx: watch::Sender<ChatBridgeSettings>,
    persist_path: Option<PathBuf>,
}

impl SettingsStore {
    /// Create an in-memory store.
    pub fn new(settings: ChatBridgeSettings) -> Self {
        let (tx, _rx) = watch::channel(settings);
        Self {
            tx,
            persist_path: None,
        }
    }

    /// Create a store that writes every change back to `path`.
    pub fn persisted(settings: ChatBridgeSettings, path: PathBuf) -> Self {
        Self {
            persist_path: Some(path),
            ..Self::new(settings)
        }
    }

    /// Clone of the current settings.
    pub fn snapshot(&self) -> ChatBridgeSettings {
        self.tx.borrow().clone()
    }

    /// Receiver notified on every change.
    pub fn subscribe(&self) -> watch::Receiver<ChatBridgeSettings> {
        self.tx.subscribe()
    }

    /// Apply `f` to the settings. Subscribers are notified only when the value
    /// actually changed. Returns whether it changed.
    pub fn update(&self, f: impl FnOnce(&mut ChatBridgeSettings)) -> bool {
        let changed = self.tx.send_if_modified(|settings| {
            let before = settings.clone();
            f(settings);
            *settings != before
        });
        if changed {
            self.persist();
        }
        changed
    }

    /// Replace the stored bearer token.
    pub fn set_token(&self, token: &str) -> bool {
        self.update(|s| token.clone_into(&mut s.twitch.token))
    }

    fn persist(&self) {
        let Some(path) = &self.persist_path else {
            return;
        };
        if let Err(e) = save_settings_to_path(path, &self.tx.borrow()) {
            tracing::warn!(path = %path.display(), error = %e, "failed to persist settings");
        }
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(ChatBridgeSettings::default())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_updates() {
        let store = SettingsStore::default();
        assert!(store.update(|s| s.twitch.chat_enable = true));
        assert!(store.snapshot().twitch.chat_enable);
    }

    #[test]
    fn unchanged_update_does_not_notify() {
        let store = SettingsStore::default();
        let mut rx = store.subscribe();
        rx.mark_unchanged();

        assert!(!store.update(|s| s.twitch.chat_enable = false));
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let store = SettingsStore::default();
        let mut rx = store.subscribe();

        assert!(store.set_token("abc"));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().twitch.token, "abc");
    }

    #[test]
    fn persisted_store_writes_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::persisted(ChatBridgeSettings::default(), path.clone());

        assert!(!path.exists());
        assert!(store.set_token("persist-me"));

        let loaded = crate::loader::read_settings_file(&path).unwrap();
        assert_eq!(loaded.twitch.token, "persist-me");
    }
}
