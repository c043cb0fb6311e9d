//! `BetterTTV` emotes.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{EmoteMap, EmoteProvider};
use crate::errors::TwitchError;
use crate::http::{build_client, join_url, read_json};

/// `BetterTTV` API v3 client.
pub struct BttvProvider {
    http: reqwest::Client,
    base_url: String,
    cdn_url: String,
}

impl BttvProvider {
    /// Create a provider. Image URLs are `{cdn_url}/emote/{id}/1x`.
    pub fn new(base_url: impl Into<String>, cdn_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: build_client(timeout),
            base_url: base_url.into(),
            cdn_url: cdn_url.into(),
        }
    }

    fn image_url(&self, id: &str) -> String {
        join_url(&self.cdn_url, &format!("emote/{id}/1x"))
    }

    fn to_map<'a>(&self, emotes: impl Iterator<Item = &'a BttvEmote>) -> EmoteMap {
        emotes
            .map(|e| (e.code.clone(), self.image_url(&e.id)))
            .collect()
    }
}

#[async_trait]
impl EmoteProvider for BttvProvider {
    fn name(&self) -> &'static str {
        "bttv"
    }

    async fn fetch(&self, channel_id: Option<&str>) -> Result<EmoteMap, TwitchError> {
        match channel_id {
            Some(id) => {
                let url = join_url(&self.base_url, &format!("cached/users/twitch/{id}"));
                let user: UserResponse = read_json(self.http.get(url).send().await?).await?;
                Ok(self.to_map(user.channel_emotes.iter().chain(&user.shared_emotes)))
            }
            None => {
                let url = join_url(&self.base_url, "cached/emotes/global");
                let emotes: Vec<BttvEmote> = read_json(self.http.get(url).send().await?).await?;
                Ok(self.to_map(emotes.iter()))
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserResponse {
    #[serde(default)]
    channel_emotes: Vec<BttvEmote>,
    #[serde(default)]
    shared_emotes: Vec<BttvEmote>,
}

#[derive(Deserialize)]
struct BttvEmote {
    id: String,
    code: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
