//! # chatbridge-settings
//!
//! Configuration management with layered sources.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`ChatBridgeSettings::default()`]
//! 2. **User file**: `~/.chatbridge/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `CHATBRIDGE_*` overrides (highest priority)
//!
//! At runtime the loaded value lives in a [`SettingsStore`], which notifies
//! subscribers whenever a value changes.
//!
//! # Usage
//!
//! ```no_run
//! use chatbridge_settings::{load_settings, SettingsStore};
//!
//! let store = SettingsStore::new(load_settings().unwrap_or_default());
//! println!("chat enabled: {}", store.snapshot().twitch.chat_enable);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod store;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    deep_merge, load_settings, load_settings_from_path, read_settings_file,
    save_settings_to_path, settings_path,
};
pub use store::SettingsStore;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_twitch() {
        let settings = ChatBridgeSettings::default();
        assert_eq!(settings.name, "chatbridge");
        assert_eq!(settings.twitch.live_check_interval_ms, 7000);
        assert!(settings.endpoints.chat_url.starts_with("wss://"));
        assert!(settings_path().ends_with(".chatbridge/settings.json"));
    }
}
