//! Shared HTTP plumbing for the vendor adapters.

use appforge_core::error::ProviderError;
use serde::de::DeserializeOwned;
use tracing::warn;

pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Build a client with a request timeout.
pub(crate) fn build_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to build HTTP client with timeout, using defaults");
            reqwest::Client::new()
        })
}

pub(crate) fn network_error(e: reqwest::Error) -> ProviderError {
    ProviderError::Network(e.to_string())
}

/// Turn a non-2xx body into an API error.
///
/// Uses the vendor's `error.message` when the body carries one, otherwise
/// `"{vendor} error ({status})"`.
pub(crate) fn api_error(vendor: &str, status: u16, body: &str) -> ProviderError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("{vendor} error ({status})"));
    ProviderError::Api {
        status_code: status,
        message,
    }
}

/// Check the status and decode a JSON body.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    vendor: &str,
) -> Result<T, ProviderError> {
    let status = response.status();
    let body = response.text().await.map_err(network_error)?;

    if !status.is_success() {
        warn!(status = status.as_u16(), vendor, body = %body, "Provider returned error");
        return Err(api_error(vendor, status.as_u16(), &body));
    }

    serde_json::from_str(&body).map_err(|e| {
        ProviderError::MalformedResponse(format!("Failed to parse {vendor} response: {e}"))
    })
}
