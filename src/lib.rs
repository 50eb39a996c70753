//! reelgen - AI media generation client.
//!
//! Client library and CLI for a remote media-generation service: job
//! submission and polling, transcript generation, credit accounting
//! against a Supabase-style ledger, and a local gallery of results.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod core;
pub mod error;
pub mod ledger;
pub mod storage;
pub mod util;

pub use error::{ExitCode, ReelgenError, Result};
