//! Credit ledger client.
//!
//! Talks to a Supabase-style backend: the `user_credits` table is read
//! through the PostgREST endpoint and mutated only through the atomic
//! `use_credit` / `use_multiple_credits` RPCs, both of which return a JSON
//! boolean success flag.
//!
//! Reads go through a short-lived cache (5 s TTL) so a burst of balance
//! checks costs one remote query. Every remote call is wrapped in a bounded
//! retry (2 extra attempts, 1 s apart). Remote failures never escape this
//! module: `check_balance` degrades to the last known value and `deduct`
//! reports `false`, with the detail logged.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ReelgenError, Result};

/// How long a fetched balance stays served from cache.
pub const BALANCE_CACHE_TTL: Duration = Duration::from_secs(5);

/// Extra attempts after the first failure of a remote call.
pub const LEDGER_MAX_RETRIES: u32 = 2;

/// Fixed delay between retry attempts.
pub const LEDGER_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Row shape of `user_credits`.
#[derive(Debug, Deserialize)]
struct CreditsRow {
    remaining_credits: u64,
}

#[derive(Debug, Clone, Copy)]
struct CachedBalance {
    value: u64,
    fetched_at: Instant,
}

/// Client for the remote credit ledger.
///
/// Constructed once per application and shared; the balance cache lives
/// inside the instance rather than in module state.
pub struct LedgerClient {
    http: Client,
    base_url: String,
    api_key: String,
    /// Authenticated principal. `None` means every read reports zero and no
    /// remote call is made.
    principal: Option<String>,
    cache: Mutex<Option<CachedBalance>>,
    cache_ttl: Duration,
    retry_delay: Duration,
}

impl LedgerClient {
    /// Create a ledger client for the given backend and principal.
    #[must_use]
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        principal: Option<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            principal,
            cache: Mutex::new(None),
            cache_ttl: BALANCE_CACHE_TTL,
            retry_delay: LEDGER_RETRY_DELAY,
        }
    }

    /// Override the cache TTL. Intended for tests.
    #[must_use]
    pub const fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Override the retry delay. Intended for tests.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Whether a principal is configured.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    /// Read the remaining balance.
    ///
    /// Serves a cached positive value younger than the TTL unless
    /// `force_refresh` is set. On remote failure after retries, falls back
    /// to the last cached value, or zero when none exists. An
    /// unauthenticated client reports zero without querying.
    pub async fn check_balance(&self, force_refresh: bool) -> u64 {
        let Some(principal) = self.principal.clone() else {
            return 0;
        };

        if !force_refresh {
            if let Some(cached) = self.cached_value() {
                debug!(balance = cached, "serving balance from cache");
                return cached;
            }
        }

        match self.with_retry(|| self.fetch_balance(&principal)).await {
            Ok(balance) => {
                *self.cache.lock().unwrap_or_else(std::sync::PoisonError::into_inner) =
                    Some(CachedBalance {
                        value: balance,
                        fetched_at: Instant::now(),
                    });
                balance
            }
            Err(e) => {
                warn!(error = %e, "balance query failed, using last known value");
                self.last_known_value()
            }
        }
    }

    /// Deduct `amount` credits atomically.
    ///
    /// Re-checks the balance with a forced refresh and fails fast when it
    /// cannot cover the amount; no partial deduction happens here. Returns
    /// `true` only when the RPC reports success, and invalidates the cache
    /// so the next read refetches.
    pub async fn deduct(&self, amount: u64) -> bool {
        if amount == 0 {
            return true;
        }
        let Some(principal) = self.principal.clone() else {
            warn!("deduction attempted without an authenticated principal");
            return false;
        };

        let balance = self.check_balance(true).await;
        if balance < amount {
            warn!(balance, amount, "insufficient credits, deduction refused");
            return false;
        }

        let outcome = self
            .with_retry(|| self.call_deduct_rpc(&principal, amount))
            .await;
        match outcome {
            Ok(true) => {
                self.invalidate_cache();
                debug!(amount, "credits deducted");
                true
            }
            Ok(false) => {
                warn!(amount, "ledger RPC refused the deduction");
                false
            }
            Err(e) => {
                warn!(error = %e, amount, "deduction failed after retries");
                false
            }
        }
    }

    /// Drop the cached balance so the next read queries the ledger.
    pub fn invalidate_cache(&self) {
        *self
            .cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
    }

    fn cached_value(&self) -> Option<u64> {
        let cache = self
            .cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        cache.and_then(|c| {
            (c.value > 0 && c.fetched_at.elapsed() < self.cache_ttl).then_some(c.value)
        })
    }

    fn last_known_value(&self) -> u64 {
        self.cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .map_or(0, |c| c.value)
    }

    async fn with_retry<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_err = None;
        for attempt in 0..=LEDGER_MAX_RETRIES {
            if attempt > 0 {
                tokio::time::sleep(self.retry_delay).await;
            }
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    debug!(attempt, error = %e, "ledger call failed");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| ReelgenError::Ledger("retry loop exhausted".to_string())))
    }

    async fn fetch_balance(&self, principal: &str) -> Result<u64> {
        let url = format!(
            "{}/rest/v1/user_credits?user_id=eq.{}&select=remaining_credits",
            self.base_url,
            urlencoding::encode(principal)
        );
        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("apikey", self.api_key.as_str())
            .send()
            .await
            .map_err(|e| ReelgenError::Ledger(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ReelgenError::Ledger(format!(
                "balance query failed: {status} - {body}"
            )));
        }

        let rows: Vec<CreditsRow> = response
            .json()
            .await
            .map_err(|e| ReelgenError::Ledger(e.to_string()))?;
        // A principal with no row has never been granted credits.
        Ok(rows.first().map_or(0, |r| r.remaining_credits))
    }

    async fn call_deduct_rpc(&self, principal: &str, amount: u64) -> Result<bool> {
        let (rpc, body) = if amount == 1 {
            (
                "use_credit",
                serde_json::json!({ "user_id": principal }),
            )
        } else {
            (
                "use_multiple_credits",
                serde_json::json!({ "user_id": principal, "credit_amount": amount }),
            )
        };
        let url = format!("{}/rest/v1/rpc/{rpc}", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("apikey", self.api_key.as_str())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ReelgenError::Ledger(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ReelgenError::Ledger(format!(
                "{rpc} failed: {status} - {text}"
            )));
        }

        response
            .json::<bool>()
            .await
            .map_err(|e| ReelgenError::Ledger(e.to_string()))
    }
}
