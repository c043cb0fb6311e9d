//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` to match the JSON the
//! host application persists. Each type implements [`Default`] with
//! production values, and `#[serde(default)]` lets partial JSON fill the
//! gaps.

mod endpoints;
mod twitch;

pub use endpoints::*;
pub use twitch::*;

use serde::{Deserialize, Serialize};

/// Root settings type.
///
/// Loaded from `~/.chatbridge/settings.json` with defaults applied for
/// missing fields. Environment variables can override specific values.
///
/// ```json
/// {
///   "twitch": { "chatEnable": true, "chatPostSource": "translation" }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatBridgeSettings {
    /// Settings schema version.
    pub version: String,
    /// Application name.
    pub name: String,
    /// Logging configuration.
    pub logging: LoggingSettings,
    /// Twitch session and chat relay flags.
    pub twitch: TwitchSettings,
    /// Remote service base URLs.
    pub endpoints: EndpointSettings,
}

impl Default for ChatBridgeSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            name: "chatbridge".to_string(),
            logging: LoggingSettings::default(),
            twitch: TwitchSettings::default(),
            endpoints: EndpointSettings::default(),
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum level (`trace`, `debug`, `info`, `warn`, `error`) or a full
    /// `EnvFilter` directive.
    pub level: String,
    /// Emit JSON lines instead of compact text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
