//! `FrankerFaceZ` emotes.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{EmoteMap, EmoteProvider};
use crate::errors::TwitchError;
use crate::http::{build_client, join_url, normalize_url, read_json};

/// `FrankerFaceZ` API v1 client.
pub struct FfzProvider {
    http: reqwest::Client,
    base_url: String,
}

impl FfzProvider {
    /// Create a provider against `base_url` (e.g. `https://api.frankerfacez.com/v1`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: build_client(timeout),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl EmoteProvider for FfzProvider {
    fn name(&self) -> &'static str {
        "ffz"
    }

    async fn fetch(&self, channel_id: Option<&str>) -> Result<EmoteMap, TwitchError> {
        match channel_id {
            Some(id) => {
                let url = join_url(&self.base_url, &format!("room/id/{id}"));
                let room: RoomResponse = read_json(self.http.get(url).send().await?).await?;
                Ok(collect_sets(room.sets.values()))
            }
            None => {
                let url = join_url(&self.base_url, "set/global");
                let global: GlobalResponse = read_json(self.http.get(url).send().await?).await?;
                let defaults = global
                    .default_sets
                    .iter()
                    .filter_map(|id| global.sets.get(&id.to_string()));
                Ok(collect_sets(defaults))
            }
        }
    }
}

fn collect_sets<'a>(sets: impl Iterator<Item = &'a EmoteSet>) -> EmoteMap {
    sets.flat_map(|set| &set.emoticons)
        .filter_map(|emote| {
            let url = emote.urls.get("1")?;
            Some((emote.name.clone(), normalize_url(url)))
        })
        .collect()
}

#[derive(Deserialize)]
struct RoomResponse {
    #[serde(default)]
    sets: HashMap<String, EmoteSet>,
}

#[derive(Deserialize)]
struct GlobalResponse {
    #[serde(default)]
    default_sets: Vec<u64>,
    #[serde(default)]
    sets: HashMap<String, EmoteSet>,
}

#[derive(Deserialize)]
struct EmoteSet {
    #[serde(default)]
    emoticons: Vec<Emoticon>,
}

#[derive(Deserialize)]
struct Emoticon {
    name: String,
    #[serde(default)]
    urls: HashMap<String, String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
