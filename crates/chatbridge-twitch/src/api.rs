//! The identity/platform API seam.

use async_trait::async_trait;

use crate::emotes::EmoteMap;
use crate::errors::TwitchError;

/// The account a bearer token belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    /// Numeric user ID (as a string, like the API returns it).
    pub id: String,
    /// Lowercase login, which is also the chat channel name.
    pub login: String,
    /// Display name with the user's chosen capitalisation.
    pub display_name: String,
    /// Profile picture URL.
    pub avatar_url: String,
}

/// Operations the session needs from the platform, bound to one token.
#[async_trait]
pub trait TwitchApi: Send + Sync {
    /// Identity behind the token.
    async fn get_identity(&self) -> Result<Identity, TwitchError>;

    /// First-party emotes available in a channel.
    async fn channel_emotes(&self, broadcaster_id: &str) -> Result<EmoteMap, TwitchError>;

    /// First-party global emotes.
    async fn global_emotes(&self) -> Result<EmoteMap, TwitchError>;

    /// Whether `login` is broadcasting right now.
    async fn is_live(&self, login: &str) -> Result<bool, TwitchError>;
}
