//! Outcome types returned by a pipeline run.

use serde::Serialize;

/// Result of one completed (non-failed) pipeline run.
#[derive(Debug, Clone, Serialize)]
pub enum RunOutcome {
    /// The archive version was new; all four publication records were
    /// written.
    Published(RunReport),
    /// The structured record for this version already existed, so the run
    /// short-circuited at the dedup check without doing any work.
    AlreadyCurrent {
        /// RFC 3339 version marker of the already-published archive.
        version: String,
    },
}

impl RunOutcome {
    /// Whether this run skipped the pipeline at the dedup check.
    pub fn is_noop(&self) -> bool {
        matches!(self, RunOutcome::AlreadyCurrent { .. })
    }

    /// The archive version this run observed.
    pub fn version(&self) -> &str {
        match self {
            RunOutcome::Published(report) => &report.version,
            RunOutcome::AlreadyCurrent { version } => version,
        }
    }
}

/// What a full pipeline run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// RFC 3339 version marker derived from the origin's `Last-Modified`.
    pub version: String,
    /// Size of the fetched archive in bytes.
    pub archive_bytes: u64,
    /// Keys written, in publication order. The timestamped structured key
    /// always precedes the `latest` alias.
    pub records: Vec<String>,
    /// Wall-clock duration of the run in milliseconds.
    pub duration_ms: u64,
}
