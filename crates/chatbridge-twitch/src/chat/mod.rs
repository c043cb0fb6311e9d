//! Chat transport.
//!
//! A transport owns the network connection to the chat service. Callers drive
//! it with [`ChatTransport::connect`], [`ChatTransport::quit`] and
//! [`ChatTransport::say`], and observe it through one ordered stream of
//! [`TransportEvent`]s handed out at construction.

pub mod message;
mod transport;

pub use message::IrcMessage;
pub use transport::{IrcConfig, IrcTransport};

use crate::errors::TransportError;

/// A chat message received from the channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    /// Channel name without the leading `#`.
    pub channel: String,
    /// Author's user ID (from the `user-id` tag; empty if absent).
    pub user_id: String,
    /// Author's login.
    pub login: String,
    /// Author's display name (falls back to the login).
    pub display_name: String,
    /// Message text (`/me` actions unwrapped).
    pub text: String,
}

impl ChatMessage {
    /// Build from a parsed `PRIVMSG` line.
    pub fn from_irc(msg: &IrcMessage) -> Option<Self> {
        if msg.command != "PRIVMSG" || msg.params.len() < 2 {
            return None;
        }
        let login = msg.nick()?.to_string();
        let display_name = msg
            .tag("display-name")
            .filter(|name| !name.is_empty())
            .map_or_else(|| login.clone(), ToString::to_string);
        let raw_text = msg.trailing()?;
        let text = raw_text
            .strip_prefix("\u{1}ACTION ")
            .and_then(|t| t.strip_suffix('\u{1}'))
            .unwrap_or(raw_text);

        Some(Self {
            channel: msg.params[0].trim_start_matches('#').to_string(),
            user_id: msg.tag("user-id").unwrap_or_default().to_string(),
            login,
            display_name,
            text: text.to_string(),
        })
    }
}

/// Lifecycle and traffic reported by a transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    /// Handshake finished; the channel is joined.
    Connected,
    /// The connection ended, from either side.
    Disconnected,
    /// A chat message arrived.
    Message(ChatMessage),
}

/// Connection to a chat service.
///
/// Methods only initiate work; outcomes arrive as [`TransportEvent`]s.
pub trait ChatTransport: Send + Sync {
    /// Start connecting. Starting while a session is already running is a
    /// no-op.
    fn connect(&self) -> Result<(), TransportError>;

    /// Ask the running session to close. A `Disconnected` event follows.
    fn quit(&self);

    /// Queue a message for `channel`.
    fn say(&self, channel: &str, message: &str) -> Result<(), TransportError>;
}
