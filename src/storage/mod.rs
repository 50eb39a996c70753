//! Local persistence: app paths, config file, settled-job registry, and
//! the gallery database.

pub mod config;
pub mod gallery;
pub mod paths;
pub mod registry;

pub use paths::AppPaths;
