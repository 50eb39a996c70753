//! Orchestration core: API client, proxy chain, job poller, pricing, and
//! settlement.

pub mod client;
pub mod http;
pub mod logging;
pub mod models;
pub mod poller;
pub mod pricing;
pub mod proxy;
pub mod settlement;
