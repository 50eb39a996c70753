//! CLI argument parsing and command dispatch.

pub mod args;
pub mod credits;
pub mod gallery;
pub mod generate;
pub mod transcript;

use std::sync::Arc;

pub use args::{Cli, Commands};

use crate::core::client::GenerationClient;
use crate::core::http::default_client;
use crate::core::proxy::ProxyChain;
use crate::error::Result;
use crate::ledger::LedgerClient;
use crate::storage::config::ResolvedConfig;
use crate::storage::AppPaths;

/// Shared services wired from configuration, built once per invocation.
pub struct AppContext {
    pub config: ResolvedConfig,
    pub paths: AppPaths,
    pub generation: Arc<GenerationClient>,
    pub ledger: Arc<LedgerClient>,
}

impl AppContext {
    /// Load configuration and construct the clients.
    ///
    /// # Errors
    ///
    /// Returns error when configuration cannot be loaded or the HTTP
    /// client cannot be built.
    pub fn build() -> Result<Self> {
        let config = ResolvedConfig::load()?;
        let paths = AppPaths::new();
        paths.ensure_dirs()?;

        let http = default_client()?;
        let proxies = ProxyChain::new(http.clone(), config.proxy_prefixes.clone());
        let generation = Arc::new(GenerationClient::new(
            http.clone(),
            config.api_url.clone(),
            proxies,
        ));
        let ledger = Arc::new(LedgerClient::new(
            http,
            config.ledger_url.clone(),
            config.ledger_key.clone(),
            config.user_id.clone(),
        ));

        Ok(Self {
            config,
            paths,
            generation,
            ledger,
        })
    }
}
