//! Third-party emote providers.
//!
//! Each provider serves a global set and a per-channel set keyed by the
//! Twitch user ID. Providers only fetch; merge order is the caller's call.

mod bttv;
mod ffz;
mod seventv;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chatbridge_settings::ChatBridgeSettings;

pub use bttv::BttvProvider;
pub use ffz::FfzProvider;
pub use seventv::SevenTvProvider;

use crate::errors::TwitchError;

/// Emote name to image URL.
pub type EmoteMap = HashMap<String, String>;

/// A source of emotes.
#[async_trait]
pub trait EmoteProvider: Send + Sync {
    /// Short provider name for logs and errors.
    fn name(&self) -> &'static str;

    /// Global emotes when `channel_id` is `None`, otherwise the emotes of
    /// that channel.
    async fn fetch(&self, channel_id: Option<&str>) -> Result<EmoteMap, TwitchError>;
}

/// The built-in providers in merge order: `FrankerFaceZ`, `BetterTTV`, 7TV.
pub fn default_providers(settings: &ChatBridgeSettings) -> Vec<Arc<dyn EmoteProvider>> {
    let endpoints = &settings.endpoints;
    let timeout = Duration::from_millis(endpoints.request_timeout_ms);
    vec![
        Arc::new(FfzProvider::new(endpoints.ffz_url.clone(), timeout)),
        Arc::new(BttvProvider::new(
            endpoints.bttv_url.clone(),
            endpoints.bttv_cdn_url.clone(),
            timeout,
        )),
        Arc::new(SevenTvProvider::new(endpoints.seventv_url.clone(), timeout)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_provider_order() {
        let providers = default_providers(&ChatBridgeSettings::default());
        let names: Vec<_> = providers.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["ffz", "bttv", "7tv"]);
    }
}
