//! 7TV emotes.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{EmoteMap, EmoteProvider};
use crate::errors::TwitchError;
use crate::http::{build_client, join_url, normalize_url, read_json};

/// File picked when the host lists no `1x` file.
const FALLBACK_FILE: &str = "1x.webp";

/// 7TV API v3 client.
pub struct SevenTvProvider {
    http: reqwest::Client,
    base_url: String,
}

impl SevenTvProvider {
    /// Create a provider against `base_url` (e.g. `https://7tv.io/v3`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: build_client(timeout),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl EmoteProvider for SevenTvProvider {
    fn name(&self) -> &'static str {
        "7tv"
    }

    async fn fetch(&self, channel_id: Option<&str>) -> Result<EmoteMap, TwitchError> {
        let set = match channel_id {
            Some(id) => {
                let url = join_url(&self.base_url, &format!("users/twitch/{id}"));
                let user: UserResponse = read_json(self.http.get(url).send().await?).await?;
                user.emote_set.unwrap_or_default()
            }
            None => {
                let url = join_url(&self.base_url, "emote-sets/global");
                read_json(self.http.get(url).send().await?).await?
            }
        };
        Ok(set
            .emotes
            .into_iter()
            .filter_map(|e| {
                let url = e.data?.host.small_url();
                Some((e.name, url))
            })
            .collect())
    }
}

#[derive(Deserialize)]
struct UserResponse {
    #[serde(default)]
    emote_set: Option<EmoteSet>,
}

#[derive(Default, Deserialize)]
struct EmoteSet {
    #[serde(default)]
    emotes: Vec<ActiveEmote>,
}

#[derive(Deserialize)]
struct ActiveEmote {
    name: String,
    #[serde(default)]
    data: Option<EmoteData>,
}

#[derive(Deserialize)]
struct EmoteData {
    host: ImageHost,
}

#[derive(Deserialize)]
struct ImageHost {
    url: String,
    #[serde(default)]
    files: Vec<ImageFile>,
}

impl ImageHost {
    fn small_url(&self) -> String {
        let file = self
            .files
            .iter()
            .map(|f| f.name.as_str())
            .find(|name| name.starts_with("1x"))
            .unwrap_or(FALLBACK_FILE);
        join_url(&normalize_url(&self.url), file)
    }
}

#[derive(Deserialize)]
struct ImageFile {
    name: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
