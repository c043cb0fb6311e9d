//! Error types for the Twitch clients.

/// Errors from REST calls (Helix and emote providers).
#[derive(Debug, thiserror::Error)]
pub enum TwitchError {
    /// HTTP request failed or the body could not be decoded.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The bearer token was rejected.
    #[error("token rejected (401): {0}")]
    Unauthorized(String),

    /// Non-success status other than 401.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// The response parsed but did not contain what was asked for.
    #[error("unexpected response: {0}")]
    InvalidResponse(String),

    /// A configured endpoint is not a valid URL.
    #[error("invalid endpoint URL {url}: {reason}")]
    InvalidUrl {
        /// The configured value.
        url: String,
        /// Parser message.
        reason: String,
    },
}

impl TwitchError {
    /// Whether the error means the token itself is no good.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

/// Errors from the chat transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// No session is running (never connected, or quit).
    #[error("chat transport is not running")]
    NotRunning,

    /// Called outside a tokio runtime.
    #[error("no async runtime available to drive the chat connection")]
    NoRuntime,

    /// Websocket connect, read, or write failed.
    #[error("websocket error: {0}")]
    WebSocket(String),

    /// The chat server rejected the credentials.
    #[error("chat authentication failed: {0}")]
    AuthFailed(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display() {
        let err = TwitchError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "API error (500): boom");
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn unauthorized_is_flagged() {
        let err = TwitchError::Unauthorized("invalid token".to_string());
        assert!(err.is_unauthorized());
        assert!(err.to_string().contains("invalid token"));
    }

    #[test]
    fn transport_error_display() {
        assert_eq!(
            TransportError::NotRunning.to_string(),
            "chat transport is not running"
        );
        assert!(
            TransportError::AuthFailed("Login authentication failed".into())
                .to_string()
                .contains("Login authentication failed")
        );
    }
}
