//! Twitch session and chat relay settings.

use std::fmt;

use chatbridge_core::TextEventSource;
use serde::{Deserialize, Serialize};

/// Twitch integration flags.
///
/// Field names match the keys the host application stores (`chatEnable`,
/// `chatPostSource`, ...). The bearer token lives here too; `Debug` redacts
/// it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TwitchSettings {
    /// Bearer token from the OAuth hand-off. Empty when logged out.
    pub token: String,
    /// Application client ID registered with Twitch.
    pub client_id: String,
    /// Redirect URI registered for the implicit OAuth flow.
    pub redirect_uri: String,
    /// Keep the chat connection open.
    pub chat_enable: bool,
    /// Publish the owner's own chat messages onto the text bus.
    pub chat_receive_enable: bool,
    /// Post final text from the bus into chat.
    pub chat_post_enable: bool,
    /// Only post while the channel is live.
    pub chat_post_live: bool,
    /// Text bus source whose events get posted.
    pub chat_post_source: TextEventSource,
    /// Also post text typed into input fields.
    pub chat_post_input: bool,
    /// Live status polling interval in milliseconds.
    pub live_check_interval_ms: u64,
}

impl TwitchSettings {
    /// Whether a token is present.
    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }
}

impl Default for TwitchSettings {
    fn default() -> Self {
        Self {
            token: String::new(),
            client_id: String::new(),
            redirect_uri: "http://localhost:1420/oauth_twitch.html".to_string(),
            chat_enable: false,
            chat_receive_enable: false,
            chat_post_enable: false,
            chat_post_live: false,
            chat_post_source: TextEventSource::Stt,
            chat_post_input: true,
            live_check_interval_ms: 7000,
        }
    }
}

impl fmt::Debug for TwitchSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwitchSettings")
            .field("token", &if self.has_token() { "<redacted>" } else { "" })
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("chat_enable", &self.chat_enable)
            .field("chat_receive_enable", &self.chat_receive_enable)
            .field("chat_post_enable", &self.chat_post_enable)
            .field("chat_post_live", &self.chat_post_live)
            .field("chat_post_source", &self.chat_post_source)
            .field("chat_post_input", &self.chat_post_input)
            .field("live_check_interval_ms", &self.live_check_interval_ms)
            .finish()
    }
}
