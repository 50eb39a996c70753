//! Client for the generation API.
//!
//! Thin request layer: job submission, status polling, and transcript
//! generation. Non-OK responses surface as [`ReelgenError::Api`] carrying
//! the body text; lifecycle handling lives in [`crate::core::poller`].

use reqwest::Client;
use tracing::{debug, info};

use crate::core::http::{ensure_ok, map_send_error, post_json, DEFAULT_TIMEOUT};
use crate::core::models::{GenerationParams, StartResponse, StatusPayload, TranscriptResponse};
use crate::core::proxy::ProxyChain;
use crate::error::{ReelgenError, Result};

/// Request body for `POST /generate_transcript`.
#[derive(Debug, serde::Serialize)]
struct TranscriptRequest<'a> {
    prompt: &'a str,
    script_model: &'a str,
}

/// Default model for transcript generation when the caller gives none.
pub const DEFAULT_SCRIPT_MODEL: &str = "gpt-4o-mini";

/// Client for the remote generation service.
#[derive(Debug, Clone)]
pub struct GenerationClient {
    client: Client,
    base_url: String,
    proxies: ProxyChain,
}

impl GenerationClient {
    /// Create a client for the given API base URL.
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>, proxies: ProxyChain) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            proxies,
        }
    }

    /// Submit a generation job, returning the remote task id.
    ///
    /// # Errors
    ///
    /// Returns error on network failure or a non-OK HTTP status (the
    /// response body text is carried in the error).
    pub async fn start_generation(&self, params: &GenerationParams) -> Result<String> {
        let url = format!("{}/generate_video", self.base_url);
        info!(topic = params.topic.as_str(), "submitting generation job");
        let response: StartResponse = post_json(&self.client, &url, params).await?;
        debug!(
            task_id = response.task_id.as_str(),
            status = response.status.as_str(),
            "job accepted"
        );
        Ok(response.task_id)
    }

    /// Fetch the current status of a job.
    ///
    /// # Errors
    ///
    /// Returns error on network failure or a non-OK HTTP status.
    pub async fn poll_status(&self, task_id: &str) -> Result<StatusPayload> {
        let url = format!(
            "{}/check_status?task_id={}",
            self.base_url,
            urlencoding::encode(task_id)
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| map_send_error(&e, DEFAULT_TIMEOUT))?;
        let response = ensure_ok(response).await?;
        response
            .json()
            .await
            .map_err(|e| ReelgenError::ParseResponse(e.to_string()))
    }

    /// Generate a transcript for a prompt.
    ///
    /// The API either inlines the transcript or returns a URL. A URL is
    /// fetched directly first; if that fails the proxy fallback chain takes
    /// over.
    ///
    /// # Errors
    ///
    /// Returns error when the request fails, the payload carries neither
    /// variant, or the follow-up fetch fails through every proxy.
    pub async fn generate_transcript(&self, prompt: &str, script_model: Option<&str>) -> Result<String> {
        let url = format!("{}/generate_transcript", self.base_url);
        let body = TranscriptRequest {
            prompt,
            script_model: script_model.unwrap_or(DEFAULT_SCRIPT_MODEL),
        };
        let response: TranscriptResponse = post_json(&self.client, &url, &body).await?;

        if let Some(transcript) = response.transcript {
            return Ok(transcript);
        }
        let Some(transcript_url) = response.transcript_url else {
            return Err(ReelgenError::ParseResponse(
                "transcript response carried neither transcript nor transcript_url".to_string(),
            ));
        };

        debug!(url = transcript_url.as_str(), "fetching transcript from URL");
        match self.fetch_text_direct(&transcript_url).await {
            Ok(text) => Ok(text),
            Err(e) => {
                debug!(error = %e, "direct transcript fetch failed, using proxy chain");
                self.proxies.get_text(&transcript_url).await
            }
        }
    }

    async fn fetch_text_direct(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| map_send_error(&e, DEFAULT_TIMEOUT))?;
        let response = ensure_ok(response).await?;
        response
            .text()
            .await
            .map_err(|e| ReelgenError::Network(e.to_string()))
    }
}
