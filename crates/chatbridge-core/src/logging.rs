//! `tracing` subscriber setup for the binary.
//!
//! Libraries only emit events. The binary calls [`init`] once, before any
//! task is spawned.

use tracing_subscriber::EnvFilter;

/// Used when the requested level is not a valid filter directive.
pub const FALLBACK_LEVEL: &str = "info";

/// How events are rendered on stderr.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One human-readable line per event.
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// `Json` when `json` is set.
    pub fn from_json_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Compact }
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `level`. Returns `false` when a subscriber was
/// already installed, in which case nothing changes.
pub fn init(level: &str, format: LogFormat) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter_for(level))
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Compact => builder.with_target(true).compact().try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    }
}

fn filter_for(level: &str) -> EnvFilter {
    if let Ok(from_env) = EnvFilter::try_from_default_env() {
        return from_env;
    }
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(FALLBACK_LEVEL))
}
