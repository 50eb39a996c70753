//! Error types for reelgen.
//!
//! Uses `thiserror` for structured error types that map to exit codes.
//!
//! ## Error Taxonomy
//!
//! Errors are categorized into five main categories:
//! - **Network**: Connection, timeout, DNS, or proxy issues
//! - **Generation**: Errors reported by the generation API (rejected
//!   submissions, job-level failures, malformed payloads)
//! - **Ledger**: Credit ledger failures (balance reads, deduction RPCs)
//! - **Configuration**: Config file parsing, validation, or missing values
//! - **Storage**: Local persistence (registry file, gallery database)
//!
//! Each error has a stable error code (e.g., `REEL-N001`) for programmatic
//! handling. Remote failures from the ledger are normally absorbed by
//! [`crate::ledger::LedgerClient`] and converted to fallback values; the
//! variants here surface everywhere else.

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// High-level error categories for classification and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network issues (timeout, DNS, connection refused, proxy exhaustion).
    Network,
    /// Generation API issues (rejected submission, job failure, bad payload).
    Generation,
    /// Credit ledger issues (balance read, deduction RPC).
    Ledger,
    /// Configuration issues (parse errors, invalid values, missing files).
    Configuration,
    /// Local storage issues (registry file, gallery database).
    Storage,
}

impl ErrorCategory {
    /// Returns a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network error",
            Self::Generation => "Generation error",
            Self::Ledger => "Ledger error",
            Self::Configuration => "Configuration error",
            Self::Storage => "Storage error",
        }
    }

    /// Returns a short code prefix for this category.
    #[must_use]
    pub const fn code_prefix(&self) -> &'static str {
        match self {
            Self::Network => "N",
            Self::Generation => "G",
            Self::Ledger => "L",
            Self::Configuration => "C",
            Self::Storage => "S",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// =============================================================================
// Exit Codes
// =============================================================================

/// Process exit codes for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// Unexpected failure
    GeneralError = 1,
    /// Configuration problem
    ConfigError = 2,
    /// Parse/format errors, malformed remote payloads
    ParseError = 3,
    /// Timeout (including the poller's hard ceiling)
    Timeout = 4,
    /// Insufficient credits to start a job
    InsufficientCredits = 5,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as Self
    }
}

// =============================================================================
// Main Error Type
// =============================================================================

/// Main error type for reelgen operations.
///
/// Each variant has:
/// - A stable error code (e.g., `REEL-N001`)
/// - A category for classification
/// - A retryable flag for retry logic
#[derive(Error, Debug)]
pub enum ReelgenError {
    // ==========================================================================
    // Network errors (Category: Network)
    // ==========================================================================
    /// Generic network failure (DNS, connection refused, TLS).
    #[error("network error: {0}")]
    Network(String),

    /// Request timed out after the specified duration.
    #[error("request timeout after {0}s")]
    Timeout(u64),

    /// Every proxy in the fallback chain failed and so did the direct fetch.
    #[error("all {attempts} proxy attempts and the direct fetch failed for {url}: {last_error}")]
    ProxyChainExhausted {
        url: String,
        attempts: usize,
        last_error: String,
    },

    // ==========================================================================
    // Generation API errors (Category: Generation)
    // ==========================================================================
    /// The generation API returned a non-OK HTTP status. Carries the
    /// response body text per the API's error convention.
    #[error("generation API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// The remote job reported a terminal error status.
    #[error("generation job failed: {0}")]
    JobFailed(String),

    /// The poller hit its hard ceiling before a terminal status arrived.
    #[error("generation timed out after {}s without completing", ceiling.as_secs())]
    JobTimeout { ceiling: Duration },

    /// A remote payload could not be parsed.
    #[error("failed to parse response: {0}")]
    ParseResponse(String),

    // ==========================================================================
    // Ledger errors (Category: Ledger)
    // ==========================================================================
    /// The ledger could not be read or mutated after retries.
    #[error("credit ledger error: {0}")]
    Ledger(String),

    /// Not enough credits to cover the estimated cost of a job.
    #[error("insufficient credits: need {needed}, have {available}")]
    InsufficientCredits { needed: u64, available: u64 },

    // ==========================================================================
    // Configuration errors (Category: Configuration)
    // ==========================================================================
    /// Configuration file or value problem.
    #[error("configuration error: {0}")]
    Config(String),

    // ==========================================================================
    // Storage errors (Category: Storage)
    // ==========================================================================
    /// Local persistence failure (registry file, gallery database).
    #[error("storage error: {0}")]
    Storage(String),
}

impl ReelgenError {
    /// Returns the category for this error.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::ProxyChainExhausted { .. } => {
                ErrorCategory::Network
            }
            Self::Api { .. }
            | Self::JobFailed(_)
            | Self::JobTimeout { .. }
            | Self::ParseResponse(_) => ErrorCategory::Generation,
            Self::Ledger(_) | Self::InsufficientCredits { .. } => ErrorCategory::Ledger,
            Self::Config(_) => ErrorCategory::Configuration,
            Self::Storage(_) => ErrorCategory::Storage,
        }
    }

    /// Returns the stable error code (e.g., `REEL-N001`).
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Network(_) => "REEL-N001",
            Self::Timeout(_) => "REEL-N002",
            Self::ProxyChainExhausted { .. } => "REEL-N003",
            Self::Api { .. } => "REEL-G001",
            Self::JobFailed(_) => "REEL-G002",
            Self::JobTimeout { .. } => "REEL-G003",
            Self::ParseResponse(_) => "REEL-G004",
            Self::Ledger(_) => "REEL-L001",
            Self::InsufficientCredits { .. } => "REEL-L002",
            Self::Config(_) => "REEL-C001",
            Self::Storage(_) => "REEL-S001",
        }
    }

    /// Whether a retry of the same operation could plausibly succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_)
                | Self::Timeout(_)
                | Self::Ledger(_)
                | Self::Api {
                    status: 500..=599,
                    ..
                }
        )
    }

    /// Maps the error to a process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::Timeout(_) | Self::JobTimeout { .. } => ExitCode::Timeout,
            Self::ParseResponse(_) => ExitCode::ParseError,
            Self::Config(_) => ExitCode::ConfigError,
            Self::InsufficientCredits { .. } => ExitCode::InsufficientCredits,
            _ => ExitCode::GeneralError,
        }
    }
}

impl From<rusqlite::Error> for ReelgenError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<std::io::Error> for ReelgenError {
    fn from(e: std::io::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ReelgenError>;
