//! Shared HTTP plumbing for the REST clients.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::errors::TwitchError;

const USER_AGENT: &str = concat!("chatbridge/", env!("CARGO_PKG_VERSION"));

/// Build a client with a per-request timeout.
pub(crate) fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default HTTP client");
            reqwest::Client::new()
        })
}

/// Map the status to an error or decode the JSON body.
pub(crate) async fn read_json<T: DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, TwitchError> {
    let status = resp.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        let text = resp.text().await.unwrap_or_default();
        return Err(TwitchError::Unauthorized(text));
    }
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        return Err(TwitchError::Api {
            status: status.as_u16(),
            message: text,
        });
    }
    Ok(resp.json().await?)
}

/// Turn a protocol-relative URL (`//cdn...`) into an https one.
pub(crate) fn normalize_url(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{url}")
    } else {
        url.to_string()
    }
}

/// Join a base URL and a path without doubling slashes.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
