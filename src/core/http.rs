//! HTTP client utilities.
//!
//! Provides a shared HTTP client for the generation API, ledger, and proxy
//! chain.

use std::time::Duration;

use reqwest::{Client, ClientBuilder, Response};

use crate::error::{ReelgenError, Result};

/// Default timeout for HTTP requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Build a configured HTTP client.
///
/// # Errors
///
/// Returns error if client construction fails.
pub fn build_client(timeout: Duration) -> Result<Client> {
    ClientBuilder::new()
        .timeout(timeout)
        .user_agent(format!("reelgen/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ReelgenError::Network(e.to_string()))
}

/// Get or create a default HTTP client.
pub fn default_client() -> Result<Client> {
    build_client(DEFAULT_TIMEOUT)
}

/// Map a reqwest error to the crate error type, distinguishing timeouts.
pub(crate) fn map_send_error(e: &reqwest::Error, timeout: Duration) -> ReelgenError {
    if e.is_timeout() {
        ReelgenError::Timeout(timeout.as_secs())
    } else {
        ReelgenError::Network(e.to_string())
    }
}

/// Check a response status, converting non-OK into an [`ReelgenError::Api`]
/// carrying the body text.
///
/// # Errors
///
/// Returns error when the response status is not success.
pub async fn ensure_ok(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ReelgenError::Api {
        status: status.as_u16(),
        body,
    })
}

/// POST a JSON body and parse the JSON response.
///
/// # Errors
///
/// Returns error on network failure, non-OK status, or JSON parse failure.
pub async fn post_json<B: serde::Serialize, T: serde::de::DeserializeOwned>(
    client: &Client,
    url: &str,
    body: &B,
) -> Result<T> {
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| map_send_error(&e, DEFAULT_TIMEOUT))?;

    let response = ensure_ok(response).await?;
    response
        .json()
        .await
        .map_err(|e| ReelgenError::ParseResponse(e.to_string()))
}
