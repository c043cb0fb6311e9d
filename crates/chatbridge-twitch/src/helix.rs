//! Twitch Helix REST client.
//!
//! Only the endpoints the session needs: the token's own user, first-party
//! emotes, and stream status. Every request carries the bearer token and the
//! `Client-Id` header.

use std::time::Duration;

use async_trait::async_trait;
use chatbridge_settings::ChatBridgeSettings;
use serde::Deserialize;

use crate::api::{Identity, TwitchApi};
use crate::emotes::EmoteMap;
use crate::errors::TwitchError;
use crate::http::{build_client, join_url, read_json};

/// Helix client bound to one bearer token.
pub struct HelixClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    token: String,
}

impl HelixClient {
    /// Create a client against `base_url` (e.g. `https://api.twitch.tv/helix`).
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http: build_client(timeout),
            base_url: base_url.into(),
            client_id: client_id.into(),
            token: token.into(),
        }
    }

    /// Create a client from settings for `token`.
    pub fn from_settings(settings: &ChatBridgeSettings, token: impl Into<String>) -> Self {
        Self::new(
            settings.endpoints.helix_url.clone(),
            settings.twitch.client_id.clone(),
            token,
            Duration::from_millis(settings.endpoints.request_timeout_ms),
        )
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(join_url(&self.base_url, path))
            .bearer_auth(&self.token)
            .header("Client-Id", &self.client_id)
    }

    /// `GET /users` with no query: the user the token belongs to.
    #[tracing::instrument(skip_all)]
    pub async fn get_me(&self) -> Result<HelixUser, TwitchError> {
        let resp = self.get("users").send().await?;
        let body: DataResponse<HelixUser> = read_json(resp).await?;
        body.data
            .into_iter()
            .next()
            .ok_or_else(|| TwitchError::InvalidResponse("no user returned for token".into()))
    }

    /// `GET /chat/emotes?broadcaster_id=`.
    #[tracing::instrument(skip(self))]
    pub async fn get_channel_emotes(
        &self,
        broadcaster_id: &str,
    ) -> Result<Vec<HelixEmote>, TwitchError> {
        let resp = self
            .get("chat/emotes")
            .query(&[("broadcaster_id", broadcaster_id)])
            .send()
            .await?;
        let body: DataResponse<HelixEmote> = read_json(resp).await?;
        Ok(body.data)
    }

    /// `GET /chat/emotes/global`.
    #[tracing::instrument(skip_all)]
    pub async fn get_global_emotes(&self) -> Result<Vec<HelixEmote>, TwitchError> {
        let resp = self.get("chat/emotes/global").send().await?;
        let body: DataResponse<HelixEmote> = read_json(resp).await?;
        Ok(body.data)
    }

    /// `GET /streams?user_login=`. `None` when the user is offline.
    #[tracing::instrument(skip(self))]
    pub async fn get_stream(&self, login: &str) -> Result<Option<HelixStream>, TwitchError> {
        let resp = self
            .get("streams")
            .query(&[("user_login", login)])
            .send()
            .await?;
        let body: DataResponse<HelixStream> = read_json(resp).await?;
        Ok(body.data.into_iter().next())
    }
}

#[async_trait]
impl TwitchApi for HelixClient {
    async fn get_identity(&self) -> Result<Identity, TwitchError> {
        self.get_me().await.map(Identity::from)
    }

    async fn channel_emotes(&self, broadcaster_id: &str) -> Result<EmoteMap, TwitchError> {
        Ok(to_emote_map(self.get_channel_emotes(broadcaster_id).await?))
    }

    async fn global_emotes(&self) -> Result<EmoteMap, TwitchError> {
        Ok(to_emote_map(self.get_global_emotes().await?))
    }

    async fn is_live(&self, login: &str) -> Result<bool, TwitchError> {
        Ok(self.get_stream(login).await?.is_some())
    }
}

fn to_emote_map(emotes: Vec<HelixEmote>) -> EmoteMap {
    emotes
        .into_iter()
        .map(|e| (e.name, e.images.url_1x))
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct DataResponse<T> {
    data: Vec<T>,
}

/// A Helix user record.
#[derive(Clone, Debug, Deserialize)]
pub struct HelixUser {
    /// User ID.
    pub id: String,
    /// Login name.
    pub login: String,
    /// Display name.
    pub display_name: String,
    /// Profile picture URL.
    #[serde(default)]
    pub profile_image_url: String,
}

impl From<HelixUser> for Identity {
    fn from(user: HelixUser) -> Self {
        Self {
            id: user.id,
            login: user.login,
            display_name: user.display_name,
            avatar_url: user.profile_image_url,
        }
    }
}

/// A Helix emote record.
#[derive(Clone, Debug, Deserialize)]
pub struct HelixEmote {
    /// Emote ID.
    pub id: String,
    /// Text that triggers the emote in chat.
    pub name: String,
    /// Static image URLs.
    pub images: HelixEmoteImages,
}

/// Static emote image URLs by scale.
#[derive(Clone, Debug, Deserialize)]
pub struct HelixEmoteImages {
    /// 1x image.
    pub url_1x: String,
    /// 2x image.
    #[serde(default)]
    pub url_2x: String,
    /// 4x image.
    #[serde(default)]
    pub url_4x: String,
}

/// A Helix stream record (present only while live).
#[derive(Clone, Debug, Deserialize)]
pub struct HelixStream {
    /// Stream ID.
    pub id: String,
    /// Broadcaster login.
    pub user_login: String,
    /// Stream title.
    #[serde(default)]
    pub title: String,
    /// Current viewers.
    #[serde(default)]
    pub viewer_count: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
