//! Application paths for config, cache, and data.

use directories::ProjectDirs;
use std::path::PathBuf;

/// Application paths.
pub struct AppPaths {
    /// Configuration directory.
    pub config: PathBuf,
    /// Cache directory.
    pub cache: PathBuf,
    /// Data directory.
    pub data: PathBuf,
}

impl AppPaths {
    /// Create paths for the reelgen application.
    #[must_use]
    pub fn new() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("io", "reelgen", "reelgen") {
            Self {
                config: proj_dirs.config_dir().to_path_buf(),
                cache: proj_dirs.cache_dir().to_path_buf(),
                data: proj_dirs.data_dir().to_path_buf(),
            }
        } else {
            // Fallback to home directory
            let home = std::env::home_dir().unwrap_or_else(|| PathBuf::from("."));
            Self {
                config: home.join(".config/reelgen"),
                cache: home.join(".cache/reelgen"),
                data: home.join(".local/share/reelgen"),
            }
        }
    }

    /// Path to the config file.
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.toml")
    }

    /// Path to the settled-jobs registry file.
    #[must_use]
    pub fn registry_file(&self) -> PathBuf {
        self.cache.join("settled-jobs.json")
    }

    /// Path to the gallery database file.
    #[must_use]
    pub fn gallery_db_file(&self) -> PathBuf {
        self.data.join("gallery.sqlite")
    }

    /// Ensure all directories exist.
    ///
    /// # Errors
    ///
    /// Returns error when a directory cannot be created.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config)?;
        std::fs::create_dir_all(&self.cache)?;
        std::fs::create_dir_all(&self.data)?;
        Ok(())
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
