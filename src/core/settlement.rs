//! Post-completion credit settlement.
//!
//! A provisional estimate gates submission; the real charge happens here,
//! computed from the measured media duration once the job completes. The
//! processed-job registry guarantees at most one deduction per job id, and
//! a shortfall drains the remaining balance rather than stranding a
//! finished job: only a zero balance defers settlement for a later attempt.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::core::models::GenerationResult;
use crate::core::pricing::actual_credits;
use crate::ledger::LedgerClient;
use crate::storage::registry::ProcessedJobRegistry;

/// Extra attempts for the deduction call on top of the first.
const DEDUCT_RETRIES: u32 = 1;

/// Outcome of a settlement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    /// The full computed cost was deducted.
    Settled { charged: u64 },
    /// The balance could not cover the cost; the entire remaining balance
    /// was deducted and the job is still considered settled.
    Partial { charged: u64, shortfall: u64 },
    /// Balance was zero: nothing deducted, job not marked, eligible for a
    /// future settlement attempt.
    Deferred { cost: u64 },
    /// The job was already settled; no deduction was performed.
    AlreadySettled,
    /// The deduction RPC failed after retries; job not marked.
    Failed { cost: u64 },
}

impl SettleOutcome {
    /// Whether the job ended up marked as settled.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(
            self,
            Self::Settled { .. } | Self::Partial { .. } | Self::AlreadySettled
        )
    }
}

/// Settles completed jobs against the ledger, at most once per job.
pub struct CreditSettlement {
    ledger: Arc<LedgerClient>,
    registry: Mutex<ProcessedJobRegistry>,
}

impl CreditSettlement {
    /// Create a settlement service over a ledger and registry.
    #[must_use]
    pub fn new(ledger: Arc<LedgerClient>, registry: ProcessedJobRegistry) -> Self {
        Self {
            ledger,
            registry: Mutex::new(registry),
        }
    }

    /// Settle a completed job.
    ///
    /// Computes the actual cost from the measured duration, checks the
    /// registry for a prior charge, then deducts: the full cost when the
    /// balance covers it, the whole remaining balance otherwise. The
    /// registry is updated (and persisted) immediately after a successful
    /// deduction.
    pub async fn settle(&self, result: &GenerationResult) -> SettleOutcome {
        let cost = actual_credits(
            result.audio_duration_secs,
            result.voice_tier,
            result.frame_interval,
        );

        let mut registry = self.registry.lock().await;
        if registry.contains(&result.job_id) {
            info!(job_id = result.job_id.as_str(), "job already settled");
            return SettleOutcome::AlreadySettled;
        }

        if cost == 0 {
            // Zero-length media bills nothing but still settles once.
            Self::mark(&mut registry, &result.job_id);
            return SettleOutcome::Settled { charged: 0 };
        }

        let balance = self.ledger.check_balance(true).await;
        if balance == 0 {
            warn!(
                job_id = result.job_id.as_str(),
                cost, "zero balance, settlement deferred"
            );
            return SettleOutcome::Deferred { cost };
        }

        let (charge, shortfall) = if balance >= cost {
            (cost, 0)
        } else {
            (balance, cost - balance)
        };

        if !self.deduct_with_retry(charge).await {
            warn!(
                job_id = result.job_id.as_str(),
                charge, "deduction failed, job left unsettled"
            );
            return SettleOutcome::Failed { cost };
        }

        Self::mark(&mut registry, &result.job_id);
        if shortfall > 0 {
            warn!(
                job_id = result.job_id.as_str(),
                charge, shortfall, "partial settlement, balance exhausted"
            );
            SettleOutcome::Partial { charged: charge, shortfall }
        } else {
            info!(job_id = result.job_id.as_str(), charge, "job settled");
            SettleOutcome::Settled { charged: charge }
        }
    }

    async fn deduct_with_retry(&self, amount: u64) -> bool {
        for attempt in 0..=DEDUCT_RETRIES {
            if self.ledger.deduct(amount).await {
                return true;
            }
            if attempt < DEDUCT_RETRIES {
                warn!(amount, "deduction attempt failed, retrying once");
            }
        }
        false
    }

    fn mark(registry: &mut ProcessedJobRegistry, job_id: &str) {
        if let Err(e) = registry.mark(job_id) {
            // In-memory mark still holds for this process.
            warn!(job_id, error = %e, "failed to persist settled-job registry");
        }
    }
}
