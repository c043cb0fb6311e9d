//! Error types for the session layer.
//!
//! Only [`AuthError`] ever reaches a caller (from `SessionManager::connect`).
//! The others are logged at the point of failure and collapse into state:
//! a skipped emote provider, or a "not live" tick.

use chatbridge_twitch::TwitchError;

/// Why a connect attempt produced no session.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The platform rejected the token.
    #[error("token rejected: {0}")]
    Unauthorized(#[source] TwitchError),

    /// The identity lookup failed for another reason.
    #[error("identity fetch failed: {0}")]
    Identity(#[source] TwitchError),

    /// A logout or a newer connect happened while this attempt was in flight.
    #[error("connect attempt superseded")]
    Superseded,
}

impl From<TwitchError> for AuthError {
    fn from(e: TwitchError) -> Self {
        if e.is_unauthorized() {
            Self::Unauthorized(e)
        } else {
            Self::Identity(e)
        }
    }
}

/// Which half of a provider's emotes a fetch was for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmoteScope {
    /// Available everywhere.
    Global,
    /// Specific to the session owner's channel.
    Channel,
}

impl std::fmt::Display for EmoteScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Channel => write!(f, "channel"),
        }
    }
}

/// One emote source failed; its contribution is skipped.
#[derive(Debug, thiserror::Error)]
#[error("{provider} {scope} emotes unavailable: {source}")]
pub struct ProviderFetchError {
    /// Provider name (`twitch`, `ffz`, `bttv`, `7tv`).
    pub provider: &'static str,
    /// Which fetch failed.
    pub scope: EmoteScope,
    /// Underlying failure.
    #[source]
    pub source: TwitchError,
}

/// A live status check failed; the tick counts as offline.
#[derive(Debug, thiserror::Error)]
#[error("live status check failed: {0}")]
pub struct ProbeError(#[from] pub TwitchError);

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn unauthorized_maps_to_unauthorized() {
        let err = AuthError::from(TwitchError::Unauthorized("invalid".into()));
        assert_matches!(err, AuthError::Unauthorized(_));
    }

    #[test]
    fn other_errors_map_to_identity() {
        let err = AuthError::from(TwitchError::Api {
            status: 500,
            message: "oops".into(),
        });
        assert_matches!(err, AuthError::Identity(_));
        assert!(err.to_string().contains("identity fetch failed"));
    }

    #[test]
    fn provider_error_names_source() {
        let err = ProviderFetchError {
            provider: "bttv",
            scope: EmoteScope::Channel,
            source: TwitchError::InvalidResponse("bad".into()),
        };
        assert_eq!(
            err.to_string(),
            "bttv channel emotes unavailable: unexpected response: bad"
        );
    }

    #[test]
    fn probe_error_display() {
        let err = ProbeError::from(TwitchError::InvalidResponse("x".into()));
        assert!(err.to_string().starts_with("live status check failed"));
    }
}
