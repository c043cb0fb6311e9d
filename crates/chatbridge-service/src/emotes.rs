//! Emote registry and the staged load that fills it.
//!
//! [`load_emotes`] fires every fetch at once, waits for all of them to
//! settle, and returns the results in precedence order. Only then does
//! [`EmoteRegistry::merge`] swap the new contents in, so a fast low-priority
//! provider is never visible before a slow high-priority one.

use std::sync::Arc;

use chatbridge_core::EmoteSpans;
use chatbridge_twitch::{EmoteMap, EmoteProvider, TwitchApi, TwitchError};
use futures::future::join_all;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::errors::{EmoteScope, ProviderFetchError};

/// Provider name used for first-party emotes.
const PLATFORM_PROVIDER: &str = "twitch";

/// Literal chat token to image URL, rebuilt in full on every merge.
#[derive(Default)]
pub struct EmoteRegistry {
    entries: RwLock<EmoteMap>,
}

impl EmoteRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with `results` applied in order. Later maps
    /// overwrite earlier ones on key collision.
    pub fn merge<I>(&self, results: I)
    where
        I: IntoIterator<Item = EmoteMap>,
    {
        let mut merged = EmoteMap::new();
        for map in results {
            merged.extend(map);
        }
        debug!(count = merged.len(), "emote registry replaced");
        *self.entries.write() = merged;
    }

    /// Word index to image URL for every whitespace-separated word that is
    /// exactly a known emote.
    ///
    /// Consecutive separators produce empty words, which keep their index.
    pub fn scan(&self, sentence: Option<&str>) -> EmoteSpans {
        let Some(sentence) = sentence.filter(|s| !s.is_empty()) else {
            return EmoteSpans::new();
        };
        let entries = self.entries.read();
        if entries.is_empty() {
            return EmoteSpans::new();
        }
        sentence
            .split(char::is_whitespace)
            .enumerate()
            .filter_map(|(index, word)| entries.get(word).map(|url| (index, url.clone())))
            .collect()
    }

    /// Image URL for one emote.
    pub fn get(&self, name: &str) -> Option<String> {
        self.entries.read().get(name).cloned()
    }

    /// Number of known emotes.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no emotes are known.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

/// Fetch every emote source for `channel_id` concurrently.
///
/// Returns the successful results in merge order: third-party globals in
/// provider order, platform globals, third-party channel sets in provider
/// order, platform channel set. Failed fetches are logged and contribute
/// nothing.
#[tracing::instrument(skip_all, fields(channel_id = %channel_id))]
pub async fn load_emotes(
    api: &dyn TwitchApi,
    providers: &[Arc<dyn EmoteProvider>],
    channel_id: &str,
) -> Vec<EmoteMap> {
    let provider_globals = join_all(providers.iter().map(|p| p.fetch(None)));
    let provider_channels = join_all(providers.iter().map(|p| p.fetch(Some(channel_id))));

    let (provider_globals, platform_global, provider_channels, platform_channel) = tokio::join!(
        provider_globals,
        api.global_emotes(),
        provider_channels,
        api.channel_emotes(channel_id),
    );

    let staged = providers
        .iter()
        .zip(provider_globals)
        .map(|(p, r)| (p.name(), EmoteScope::Global, r))
        .chain([(PLATFORM_PROVIDER, EmoteScope::Global, platform_global)])
        .chain(
            providers
                .iter()
                .zip(provider_channels)
                .map(|(p, r)| (p.name(), EmoteScope::Channel, r)),
        )
        .chain([(PLATFORM_PROVIDER, EmoteScope::Channel, platform_channel)]);

    staged
        .filter_map(|(provider, scope, result)| accept(provider, scope, result))
        .collect()
}

fn accept(
    provider: &'static str,
    scope: EmoteScope,
    result: Result<EmoteMap, TwitchError>,
) -> Option<EmoteMap> {
    match result {
        Ok(map) => {
            debug!(provider, %scope, count = map.len(), "emotes fetched");
            Some(map)
        }
        Err(source) => {
            let err = ProviderFetchError {
                provider,
                scope,
                source,
            };
            warn!(error = %err, "skipping emote source");
            None
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
