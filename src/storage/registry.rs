//! Processed-job registry.
//!
//! A persisted set of job ids that have already been charged, checked
//! before any settlement attempt so a job is deducted at most once even
//! across process restarts. Marks are persisted immediately
//! (append-then-persist) with an atomic temp-file + rename write.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{ReelgenError, Result};

/// Set of job ids that have been settled, backed by a JSON file.
#[derive(Debug)]
pub struct ProcessedJobRegistry {
    path: PathBuf,
    jobs: HashSet<String>,
}

impl ProcessedJobRegistry {
    /// Open the registry at `path`, loading any existing entries. A missing
    /// or corrupt file starts the registry empty rather than failing: a
    /// lost registry can only cause an extra charge attempt, which the
    /// ledger-side balance check still bounds.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let jobs = std::fs::read_to_string(&path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default();
        Self { path, jobs }
    }

    /// Whether a job has already been settled.
    #[must_use]
    pub fn contains(&self, job_id: &str) -> bool {
        self.jobs.contains(job_id)
    }

    /// Record a job as settled and persist immediately.
    ///
    /// # Errors
    ///
    /// Returns error when the registry file cannot be written; the
    /// in-memory entry is kept either way so the running process will not
    /// double-charge.
    pub fn mark(&mut self, job_id: &str) -> Result<()> {
        if !self.jobs.insert(job_id.to_string()) {
            return Ok(());
        }
        self.persist()
    }

    /// Number of settled jobs on record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(&self.jobs)
            .map_err(|e| ReelgenError::Storage(e.to_string()))?;
        write_atomic(&self.path, json.as_bytes())
    }
}

/// Write bytes to `path` via a temp file and rename, so readers never see a
/// partial file.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    {
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp, path).map_err(|e| ReelgenError::Storage(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn mark_and_contains() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("settled-jobs.json");
        let mut registry = ProcessedJobRegistry::open(&path);

        assert!(!registry.contains("task-1"));
        registry.mark("task-1").expect("mark");
        assert!(registry.contains("task-1"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn marks_survive_reopen() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("settled-jobs.json");

        let mut registry = ProcessedJobRegistry::open(&path);
        registry.mark("task-1").expect("mark");
        registry.mark("task-2").expect("mark");
        drop(registry);

        let reopened = ProcessedJobRegistry::open(&path);
        assert!(reopened.contains("task-1"));
        assert!(reopened.contains("task-2"));
        assert!(!reopened.contains("task-3"));
    }

    #[test]
    fn double_mark_is_a_no_op() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("settled-jobs.json");
        let mut registry = ProcessedJobRegistry::open(&path);

        registry.mark("task-1").expect("mark");
        registry.mark("task-1").expect("re-mark");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn persist_failure_surfaces_as_a_storage_error() {
        let dir = tempdir().expect("tempdir");
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").expect("write");

        // The parent is a regular file, so the registry cannot be written.
        let mut registry = ProcessedJobRegistry::open(blocker.join("settled-jobs.json"));
        let err = registry.mark("task-1").expect_err("should fail");
        assert!(matches!(err, ReelgenError::Storage(_)));
        // The in-memory mark still guards this process.
        assert!(registry.contains("task-1"));
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("settled-jobs.json");
        std::fs::write(&path, "{not json").expect("write");

        let registry = ProcessedJobRegistry::open(&path);
        assert!(registry.is_empty());
    }
}
