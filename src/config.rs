//! Configuration for the ingestion pipeline.
//!
//! Every knob lives in one [`IngestConfig`] constructed once at process
//! start and passed by reference into the orchestrator constructor; the
//! pipeline never reads ambient process-wide state. Keeping the whole
//! configuration in one struct makes it trivial to log a run's exact
//! settings and to substitute converter binaries in tests.

use crate::error::IngestError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default archive location published by Radio Spectrum Management.
pub const DEFAULT_ARCHIVE_URL: &str =
    "https://www.rsm.govt.nz/assets/Uploads/documents/prism/prism.zip";

/// Default target bucket for published artifacts.
pub const DEFAULT_BUCKET: &str = "nz-wireless-map";

/// Configuration for one ingestion service instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// URL of the archive to fetch. Default: the RSM prism.zip location.
    pub archive_url: String,

    /// Target bucket/container identifier. Consumed by the binary when it
    /// constructs the blob-store backend; the pipeline itself only ever
    /// sees the constructed [`crate::store::BlobStore`].
    pub bucket: String,

    /// Name of the database entry expected inside the archive.
    pub database_entry: String,

    /// Listening port for the trigger endpoint. Default: 8080.
    pub http_port: u16,

    /// Java runtime used to launch the MDB-to-SQLite converter.
    pub java_program: PathBuf,

    /// Path to the `mdb-sqlite.jar` converter.
    pub mdb_converter_jar: PathBuf,

    /// `sqlite3` binary, used for the analyze pass and the tabular extract.
    pub sqlite_program: PathBuf,

    /// Python runtime used to launch the structuring converter.
    pub python_program: PathBuf,

    /// Path to the CSV-to-JSON structuring script.
    pub structuring_script: PathBuf,

    /// SQL file holding the fixed extraction query fed to `sqlite3` on
    /// stdin. The query itself is deployment data, not code.
    pub extraction_query: PathBuf,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            archive_url: DEFAULT_ARCHIVE_URL.to_string(),
            bucket: DEFAULT_BUCKET.to_string(),
            database_entry: "prism.mdb".to_string(),
            http_port: 8080,
            java_program: PathBuf::from("/usr/bin/java"),
            mdb_converter_jar: PathBuf::from("mdb-sqlite.jar"),
            sqlite_program: PathBuf::from("/usr/bin/sqlite3"),
            python_program: PathBuf::from("/usr/bin/python3"),
            structuring_script: PathBuf::from("csv2json2.py"),
            extraction_query: PathBuf::from("select_point_to_point_links.sql"),
        }
    }
}

impl IngestConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Internal`] when a field is unusable (empty
    /// URL or entry name, non-HTTP scheme). Converter paths are not probed
    /// here; a missing binary surfaces as a `Conversion` error at run
    /// time, with the spawn failure attached.
    pub fn validate(&self) -> Result<(), IngestError> {
        if !self.archive_url.starts_with("http://") && !self.archive_url.starts_with("https://") {
            return Err(IngestError::Internal(format!(
                "archive_url must be an HTTP(S) URL, got '{}'",
                self.archive_url
            )));
        }
        if self.database_entry.is_empty() {
            return Err(IngestError::Internal(
                "database_entry must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
