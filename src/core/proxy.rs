//! CORS-proxy fallback chain.
//!
//! Some media URLs returned by the generation API sit behind hosts that
//! reject direct cross-origin requests. This module wraps a GET in an
//! ordered list of public relay prefixes: each attempt fetches
//! `prefix + urlencode(target)`, the first HTTP-OK response wins, and after
//! the list is exhausted one final direct request is issued whose outcome is
//! returned as-is. Attempts are strictly sequential.

use reqwest::{Client, Response};
use tracing::{debug, warn};

use crate::error::{ReelgenError, Result};

/// Default relay prefixes, tried in order.
pub const DEFAULT_PROXY_PREFIXES: &[&str] = &[
    "https://corsproxy.io/?",
    "https://api.allorigins.win/raw?url=",
    "https://proxy.cors.sh/",
];

/// Ordered proxy fallback chain over a shared HTTP client.
#[derive(Debug, Clone)]
pub struct ProxyChain {
    client: Client,
    prefixes: Vec<String>,
}

impl ProxyChain {
    /// Create a chain with the given relay prefixes.
    #[must_use]
    pub fn new(client: Client, prefixes: Vec<String>) -> Self {
        Self { client, prefixes }
    }

    /// Create a chain with the built-in relay list.
    #[must_use]
    pub fn with_defaults(client: Client) -> Self {
        Self::new(
            client,
            DEFAULT_PROXY_PREFIXES.iter().map(ToString::to_string).collect(),
        )
    }

    /// GET `url` through the relay chain, falling back to a direct request.
    ///
    /// Relay attempts that error or return non-OK advance to the next
    /// prefix. The final direct attempt's outcome is returned unmodified:
    /// a non-OK direct response is returned as a success value, matching
    /// plain-fetch semantics.
    ///
    /// # Errors
    ///
    /// Returns error only when the direct fallback request itself fails to
    /// send.
    pub async fn get(&self, url: &str) -> Result<Response> {
        let encoded = urlencoding::encode(url);
        for prefix in &self.prefixes {
            let proxied = format!("{prefix}{encoded}");
            match self.client.get(&proxied).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(prefix = prefix.as_str(), "proxy attempt succeeded");
                    return Ok(response);
                }
                Ok(response) => {
                    debug!(
                        prefix = prefix.as_str(),
                        status = response.status().as_u16(),
                        "proxy attempt returned non-OK, trying next"
                    );
                }
                Err(e) => {
                    debug!(prefix = prefix.as_str(), error = %e, "proxy attempt failed, trying next");
                }
            }
        }

        warn!(url, "all proxies exhausted, attempting direct fetch");
        self.client
            .get(url)
            .send()
            .await
            .map_err(|e| ReelgenError::Network(e.to_string()))
    }

    /// GET `url` and return the body text, failing on non-OK from the
    /// direct fallback as well.
    ///
    /// # Errors
    ///
    /// Returns [`ReelgenError::ProxyChainExhausted`] when every relay and
    /// the direct fetch failed to produce an OK response.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let attempts = self.prefixes.len();
        let response = self.get(url).await?;
        if !response.status().is_success() {
            return Err(ReelgenError::ProxyChainExhausted {
                url: url.to_string(),
                attempts,
                last_error: format!("direct fetch returned HTTP {}", response.status().as_u16()),
            });
        }
        response
            .text()
            .await
            .map_err(|e| ReelgenError::Network(e.to_string()))
    }
}
