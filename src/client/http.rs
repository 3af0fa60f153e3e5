//! Shared HTTP client and response-normalization helpers.

use std::sync::OnceLock;

use crate::error::LendkitError;

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .pool_max_idle_per_host(10)
            .build()
            .expect("Failed to build HTTP client")
    })
}

/// Fallback message when the backend sends no usable error detail.
pub(crate) const GENERIC_ERROR_MESSAGE: &str = "Request failed";

/// Normalize a non-success response body into an API error.
///
/// The body is parsed tolerantly: absent or malformed JSON falls back to a
/// generic message instead of surfacing a parse failure. Message lookup
/// order follows what the backend emits: `error`, then `detail`, then
/// `message`.
pub(crate) fn normalize_error_body(status: u16, body: &str) -> LendkitError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| extract_message(&value))
        .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());
    LendkitError::api(status, message)
}

fn extract_message(value: &serde_json::Value) -> Option<String> {
    ["error", "detail", "message"]
        .iter()
        .find_map(|key| value.get(key).and_then(|m| m.as_str()))
        .map(String::from)
}
