//! Configuration file loading and management.
//!
//! Loads configuration from:
//! - Linux/macOS: `~/.config/reelgen/config.toml`
//! - Windows: `%APPDATA%/reelgen/config.toml`
//!
//! ## Precedence
//!
//! Settings are resolved with the following precedence (highest first):
//! 1. Environment variables
//! 2. Config file
//! 3. Built-in defaults
//!
//! ## Environment Variables
//!
//! - `REELGEN_API_URL`: Generation API base URL
//! - `REELGEN_LEDGER_URL`: Credit ledger (Supabase) base URL
//! - `REELGEN_LEDGER_KEY`: Ledger API key
//! - `REELGEN_USER_ID`: Authenticated principal for credit accounting
//! - `REELGEN_CONFIG`: Override config file path
//!
//! Poller timings and the proxy relay list are compile-time constants; only
//! endpoints and credentials are configurable.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::core::proxy::DEFAULT_PROXY_PREFIXES;
use crate::error::{ReelgenError, Result};

// =============================================================================
// Environment Variable Names
// =============================================================================

/// Environment variable for the generation API base URL.
pub const ENV_API_URL: &str = "REELGEN_API_URL";
/// Environment variable for the ledger base URL.
pub const ENV_LEDGER_URL: &str = "REELGEN_LEDGER_URL";
/// Environment variable for the ledger API key.
pub const ENV_LEDGER_KEY: &str = "REELGEN_LEDGER_KEY";
/// Environment variable for the principal user id.
pub const ENV_USER_ID: &str = "REELGEN_USER_ID";
/// Environment variable to override the config file path.
pub const ENV_CONFIG: &str = "REELGEN_CONFIG";

/// Default generation API base URL.
pub const DEFAULT_API_URL: &str = "https://api.reelgen.io";
/// Default ledger base URL.
pub const DEFAULT_LEDGER_URL: &str = "https://ledger.reelgen.io";

// =============================================================================
// Config File Shape
// =============================================================================

/// On-disk configuration file contents. Every field is optional; missing
/// values fall back to defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub ledger: LedgerSection,
}

/// `[api]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSection {
    pub base_url: Option<String>,
    /// Relay prefixes tried before a direct fetch, in order.
    pub proxy_prefixes: Option<Vec<String>>,
}

/// `[ledger]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerSection {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub user_id: Option<String>,
}

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Fully resolved configuration after merging env vars, the config file,
/// and defaults.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Generation API base URL.
    pub api_url: String,
    /// Relay prefixes for the proxy fallback chain.
    pub proxy_prefixes: Vec<String>,
    /// Ledger base URL.
    pub ledger_url: String,
    /// Ledger API key; empty when unset.
    pub ledger_key: String,
    /// Principal for credit accounting. `None` means unauthenticated: every
    /// balance read reports zero.
    pub user_id: Option<String>,
}

impl ResolvedConfig {
    /// Load and resolve configuration from the default locations.
    ///
    /// # Errors
    ///
    /// Returns error when an existing config file cannot be parsed.
    pub fn load() -> Result<Self> {
        let paths = AppPaths::new();
        let path = std::env::var(ENV_CONFIG)
            .map_or_else(|_| paths.config_file(), std::path::PathBuf::from);
        let file = load_config_file(&path)?;
        Ok(Self::resolve(&file))
    }

    /// Resolve a parsed config file against env vars and defaults.
    #[must_use]
    pub fn resolve(file: &ConfigFile) -> Self {
        let api_url = env_or(ENV_API_URL)
            .or_else(|| file.api.base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let proxy_prefixes = file.api.proxy_prefixes.clone().unwrap_or_else(|| {
            DEFAULT_PROXY_PREFIXES
                .iter()
                .map(ToString::to_string)
                .collect()
        });
        let ledger_url = env_or(ENV_LEDGER_URL)
            .or_else(|| file.ledger.url.clone())
            .unwrap_or_else(|| DEFAULT_LEDGER_URL.to_string());
        let ledger_key = env_or(ENV_LEDGER_KEY)
            .or_else(|| file.ledger.api_key.clone())
            .unwrap_or_default();
        let user_id = env_or(ENV_USER_ID).or_else(|| file.ledger.user_id.clone());

        Self {
            api_url,
            proxy_prefixes,
            ledger_url,
            ledger_key,
            user_id,
        }
    }
}

fn env_or(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Parse the config file at `path`, treating a missing file as defaults.
///
/// # Errors
///
/// Returns error when the file exists but cannot be read or parsed.
pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    let text =
        fs::read_to_string(path).map_err(|e| ReelgenError::Config(format!("{}: {e}", path.display())))?;
    toml::from_str(&text).map_err(|e| ReelgenError::Config(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let file = load_config_file(Path::new("/nonexistent/reelgen-config.toml")).expect("load");
        let config = ResolvedConfig::resolve(&file);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.proxy_prefixes.len(), DEFAULT_PROXY_PREFIXES.len());
        assert!(config.ledger_key.is_empty());
    }

    #[test]
    fn file_values_override_defaults() {
        let file: ConfigFile = toml::from_str(
            r#"
            [api]
            base_url = "https://api.example.test"
            proxy_prefixes = ["https://relay.example.test/?"]

            [ledger]
            url = "https://ledger.example.test"
            api_key = "anon-key"
            user_id = "user-42"
            "#,
        )
        .expect("parse");
        let config = ResolvedConfig::resolve(&file);
        assert_eq!(config.api_url, "https://api.example.test");
        assert_eq!(config.proxy_prefixes, vec!["https://relay.example.test/?"]);
        assert_eq!(config.ledger_url, "https://ledger.example.test");
        assert_eq!(config.user_id.as_deref(), Some("user-42"));
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api\nbase_url = ").expect("write");
        let err = load_config_file(&path).expect_err("should fail");
        assert!(matches!(err, ReelgenError::Config(_)));
    }
}
