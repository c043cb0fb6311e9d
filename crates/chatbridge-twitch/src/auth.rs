//! Implicit-flow OAuth helpers.
//!
//! The browser redirect itself is handled by the host application. This
//! module builds the authorize URL it opens and parses the message the
//! redirect page posts back (`smplstt_tw_auth:<token>`).

use chatbridge_settings::ChatBridgeSettings;
use reqwest::Url;

use crate::errors::TwitchError;

/// Scopes requested: read and send chat, read subscriptions.
pub const SCOPES: &[&str] = &["chat:read", "chat:edit", "channel:read:subscriptions"];

/// Prefix of the token hand-off message posted by the redirect page.
pub const AUTH_MESSAGE_PREFIX: &str = "smplstt_tw_auth:";

/// What the redirect collaborator needs to build the authorize URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OAuthConfig {
    /// Authorize endpoint.
    pub authorize_url: String,
    /// Application client ID.
    pub client_id: String,
    /// Registered redirect URI.
    pub redirect_uri: String,
    /// Requested scopes.
    pub scopes: Vec<String>,
}

impl OAuthConfig {
    /// Build from settings with the default [`SCOPES`].
    pub fn from_settings(settings: &ChatBridgeSettings) -> Self {
        Self {
            authorize_url: settings.endpoints.oauth_authorize_url.clone(),
            client_id: settings.twitch.client_id.clone(),
            redirect_uri: settings.twitch.redirect_uri.clone(),
            scopes: SCOPES.iter().map(ToString::to_string).collect(),
        }
    }

    /// The URL to open in a browser window.
    ///
    /// Scopes are space-separated, which form encoding renders as `+`.
    pub fn authorization_url(&self) -> Result<String, TwitchError> {
        let scope = self.scopes.join(" ");
        let url = Url::parse_with_params(
            &self.authorize_url,
            [
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "token"),
                ("scope", scope.as_str()),
            ],
        )
        .map_err(|e| TwitchError::InvalidUrl {
            url: self.authorize_url.clone(),
            reason: e.to_string(),
        })?;
        Ok(url.into())
    }
}

/// Extract the access token from a hand-off message.
///
/// Returns `None` for messages that are not hand-offs or carry no token.
pub fn parse_auth_message(message: &str) -> Option<&str> {
    let rest = message.strip_prefix(AUTH_MESSAGE_PREFIX)?;
    let token = rest.split(':').next()?;
    (!token.is_empty()).then_some(token)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
