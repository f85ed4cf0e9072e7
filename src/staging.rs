//! Ephemeral staging files bridging external converters.
//!
//! ## Why real files?
//!
//! The MDB and SQLite converters take file-path arguments; they cannot
//! stream from a pipe. Each run owns one [`Staging`] area backed by a
//! `tempfile::TempDir`: every acquired file lives inside it, and dropping
//! the `Staging` removes the whole directory on every exit path, whether
//! that is success, a propagated error, or a panic. The directory name is unique per run, so
//! concurrent runs never collide on the filesystem.

use crate::error::IngestError;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use tempfile::TempDir;
use tracing::debug;

/// Per-run staging area. All acquired files are deleted when this drops.
pub struct Staging {
    dir: TempDir,
    seq: AtomicU32,
}

/// Handle to one staging file.
///
/// The handle carries only the path; the file's lifetime is tied to the
/// [`Staging`] that produced it, never to the handle.
#[derive(Debug, Clone)]
pub struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    /// Path to hand to a converter subprocess.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Staging {
    /// Allocates a fresh staging area for one run.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Resource`] on filesystem exhaustion.
    pub fn new() -> Result<Self, IngestError> {
        let dir = TempDir::new().map_err(|source| IngestError::Resource { source })?;
        debug!("staging area at {}", dir.path().display());
        Ok(Self {
            dir,
            seq: AtomicU32::new(0),
        })
    }

    /// Creates a uniquely named empty file labelled for diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Resource`] when the file cannot be created.
    pub fn acquire(&self, label: &str) -> Result<StagedFile, IngestError> {
        let n = self.seq.fetch_add(1, Ordering::Relaxed);
        let path = self.dir.path().join(format!("{n:02}-{label}"));
        std::fs::File::create(&path).map_err(|source| IngestError::Resource { source })?;
        debug!("staged {}", path.display());
        Ok(StagedFile { path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_creates_file() {
        let staging = Staging::new().unwrap();
        let f = staging.acquire("prism.mdb").unwrap();
        assert!(f.path().exists());
    }

    #[test]
    fn same_label_gets_unique_paths() {
        let staging = Staging::new().unwrap();
        let a = staging.acquire("prism.sqlite3").unwrap();
        let b = staging.acquire("prism.sqlite3").unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a.path().exists() && b.path().exists());
    }

    #[test]
    fn drop_removes_all_files() {
        let staging = Staging::new().unwrap();
        let kept = staging.acquire("prism.mdb").unwrap();
        let path = kept.path().to_path_buf();
        assert!(path.exists());
        drop(staging);
        // The handle outliving the staging area must not keep the file alive.
        assert!(!path.exists());
        assert!(!kept.path().exists());
    }

    #[test]
    fn concurrent_runs_use_distinct_directories() {
        let a = Staging::new().unwrap();
        let b = Staging::new().unwrap();
        let fa = a.acquire("x").unwrap();
        let fb = b.acquire("x").unwrap();
        assert_ne!(fa.path().parent(), fb.path().parent());
    }
}
