//! Reading and writing the settings file.
//!
//! Values are layered: compiled defaults, then whatever the JSON file sets,
//! then `CHATBRIDGE_*` environment variables. The file only needs the keys
//! it wants to change. When layering the file over the defaults, nested
//! objects combine key by key, arrays and scalars replace, and `null` leaves
//! the default in place.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::ChatBridgeSettings;

/// `~/.chatbridge/settings.json`, or under `/tmp` when `HOME` is unset.
pub fn settings_path() -> PathBuf {
    std::env::var_os("HOME")
        .map_or_else(|| PathBuf::from("/tmp"), PathBuf::from)
        .join(".chatbridge")
        .join("settings.json")
}

/// [`load_settings_from_path`] at [`settings_path`].
pub fn load_settings() -> Result<ChatBridgeSettings> {
    load_settings_from_path(&settings_path())
}

/// File layered over defaults, then environment overrides.
///
/// A missing file is not an error. A file that is not valid JSON, or whose
/// values have the wrong shape, is.
pub fn load_settings_from_path(path: &Path) -> Result<ChatBridgeSettings> {
    let mut settings = read_settings_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// File layered over defaults, without environment overrides.
pub fn read_settings_file(path: &Path) -> Result<ChatBridgeSettings> {
    let mut layered = serde_json::to_value(ChatBridgeSettings::default())?;

    match std::fs::read_to_string(path) {
        Ok(content) => {
            debug!(path = %path.display(), "settings file found");
            deep_merge(&mut layered, serde_json::from_str(&content)?);
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no settings file, defaults only");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(serde_json::from_value(layered)?)
}

/// Write `settings` as pretty JSON, creating parent directories.
///
/// On unix the file is made owner-only since it holds the bearer token.
pub fn save_settings_to_path(path: &Path, settings: &ChatBridgeSettings) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(settings)?)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

/// Layer `overlay` onto `base` in place.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => deep_merge(slot, value),
                    None if value.is_null() => {}
                    None => {
                        let _ = base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Apply `CHATBRIDGE_*` overrides.
///
/// Unparseable values are logged and skipped, so a typo never hides the
/// file or default value behind it.
pub fn apply_env_overrides(settings: &mut ChatBridgeSettings) {
    let twitch = &mut settings.twitch;
    override_with("CHATBRIDGE_TWITCH_TOKEN", &mut twitch.token, non_empty);
    override_with("CHATBRIDGE_TWITCH_CLIENT_ID", &mut twitch.client_id, non_empty);
    override_with("CHATBRIDGE_TWITCH_REDIRECT_URI", &mut twitch.redirect_uri, non_empty);
    override_with("CHATBRIDGE_CHAT_ENABLE", &mut twitch.chat_enable, parse_bool);
    override_with("CHATBRIDGE_CHAT_RECEIVE_ENABLE", &mut twitch.chat_receive_enable, parse_bool);
    override_with("CHATBRIDGE_CHAT_POST_ENABLE", &mut twitch.chat_post_enable, parse_bool);
    override_with("CHATBRIDGE_CHAT_POST_LIVE", &mut twitch.chat_post_live, parse_bool);
    override_with("CHATBRIDGE_CHAT_POST_INPUT", &mut twitch.chat_post_input, parse_bool);
    override_with("CHATBRIDGE_CHAT_POST_SOURCE", &mut twitch.chat_post_source, |v| {
        serde_json::from_value(Value::String(v.to_lowercase())).ok()
    });
    override_with("CHATBRIDGE_LIVE_CHECK_INTERVAL_MS", &mut twitch.live_check_interval_ms, |v| {
        parse_u64_range(v, 1_000, 600_000)
    });

    let logging = &mut settings.logging;
    override_with("CHATBRIDGE_LOG_LEVEL", &mut logging.level, non_empty);
    override_with("CHATBRIDGE_LOG_JSON", &mut logging.json, parse_bool);

    let endpoints = &mut settings.endpoints;
    override_with("CHATBRIDGE_HELIX_URL", &mut endpoints.helix_url, non_empty);
    override_with("CHATBRIDGE_CHAT_URL", &mut endpoints.chat_url, non_empty);
    override_with("CHATBRIDGE_REQUEST_TIMEOUT_MS", &mut endpoints.request_timeout_ms, |v| {
        parse_u64_range(v, 100, 120_000)
    });
}

/// `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`, any case.
pub fn parse_bool(val: &str) -> Option<bool> {
    const TRUE: [&str; 4] = ["true", "1", "yes", "on"];
    const FALSE: [&str; 4] = ["false", "0", "no", "off"];
    let val = val.trim();
    if TRUE.iter().any(|t| t.eq_ignore_ascii_case(val)) {
        Some(true)
    } else if FALSE.iter().any(|f| f.eq_ignore_ascii_case(val)) {
        Some(false)
    } else {
        None
    }
}

/// An integer in `min..=max`.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    val.trim()
        .parse::<u64>()
        .ok()
        .filter(|n| (min..=max).contains(n))
}

fn non_empty(val: &str) -> Option<String> {
    (!val.is_empty()).then(|| val.to_string())
}

fn override_with<T>(name: &str, slot: &mut T, parse: impl FnOnce(&str) -> Option<T>) {
    let Ok(raw) = std::env::var(name) else {
        return;
    };
    match parse(&raw) {
        Some(value) => *slot = value,
        None if raw.is_empty() => {}
        None => warn!(key = name, value = %raw, "ignoring invalid environment override"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
