//! Remote service base URLs.
//!
//! Overridable so tests and self-hosted mirrors can point the clients
//! elsewhere.

use serde::{Deserialize, Serialize};

/// Base URLs for every remote service chatbridge talks to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EndpointSettings {
    /// Twitch Helix REST API.
    pub helix_url: String,
    /// Twitch OAuth authorize endpoint.
    pub oauth_authorize_url: String,
    /// Twitch chat over websocket.
    pub chat_url: String,
    /// `FrankerFaceZ` API.
    pub ffz_url: String,
    /// `BetterTTV` API.
    pub bttv_url: String,
    /// `BetterTTV` emote CDN.
    pub bttv_cdn_url: String,
    /// 7TV API.
    pub seventv_url: String,
    /// Timeout for each REST request, in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            helix_url: "https://api.twitch.tv/helix".to_string(),
            oauth_authorize_url: "https://id.twitch.tv/oauth2/authorize".to_string(),
            chat_url: "wss://irc-ws.chat.twitch.tv:443".to_string(),
            ffz_url: "https://api.frankerfacez.com/v1".to_string(),
            bttv_url: "https://api.betterttv.net/3".to_string(),
            bttv_cdn_url: "https://cdn.betterttv.net".to_string(),
            seventv_url: "https://7tv.io/v3".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}
