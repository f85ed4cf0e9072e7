//! Error types for the prism-fetch library.
//!
//! Every pipeline stage maps its failures into one [`IngestError`] variant,
//! so a run either succeeds end-to-end or surfaces exactly one fatal error
//! to the trigger caller. There is no in-process retry: the external
//! scheduler re-triggers the whole run on its next interval, and the dedup
//! check makes re-runs of an already-published version cheap no-ops.
//!
//! The variants mirror where in the pipeline a run can die:
//!
//! * [`IngestError::Fetch`]      — origin unreachable or non-success status
//! * [`IngestError::Timestamp`]  — version marker missing or unparseable
//! * [`IngestError::Store`]      — blob-store backend failure
//! * [`IngestError::NotFound`]   — expected database entry absent from the archive
//! * [`IngestError::Conversion`] — external converter exited non-zero
//! * [`IngestError::Resource`]   — staging-file allocation failed

use thiserror::Error;

/// All fatal errors returned by the prism-fetch pipeline.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The archive could not be fetched from the origin.
    #[error("failed to fetch '{url}': {reason}")]
    Fetch { url: String, reason: String },

    /// The origin's `Last-Modified` header is absent or unparseable.
    ///
    /// The header is the only version marker the origin publishes, so a run
    /// without it cannot be deduplicated and is aborted before the archive
    /// body is read.
    #[error("couldn't parse Last-Modified header {header:?}: {reason}")]
    Timestamp { header: String, reason: String },

    /// The blob store failed on a read or write.
    ///
    /// A "not found" existence check is a normal `false`, never this error.
    #[error("blob store operation on '{key}' failed: {reason}")]
    Store { key: String, reason: String },

    /// The archive was fetched but holds no entry with the expected
    /// database filename. Indicates an upstream format change; retrying
    /// won't help.
    #[error("no '{entry}' found in archive: {detail}")]
    NotFound { entry: String, detail: String },

    /// An external converter subprocess failed.
    ///
    /// `detail` carries the exit status and the subprocess's captured
    /// stdout/stderr for diagnostics.
    #[error("{stage} converter failed: {detail}")]
    Conversion { stage: &'static str, detail: String },

    /// An ephemeral staging file could not be allocated.
    #[error("couldn't create staging file")]
    Resource {
        #[source]
        source: std::io::Error,
    },

    /// Unexpected internal error (e.g. a background task panicked).
    #[error("internal error: {0}")]
    Internal(String),
}

impl IngestError {
    /// Short machine-friendly name of the variant, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::Fetch { .. } => "fetch",
            IngestError::Timestamp { .. } => "timestamp",
            IngestError::Store { .. } => "store",
            IngestError::NotFound { .. } => "not_found",
            IngestError::Conversion { .. } => "conversion",
            IngestError::Resource { .. } => "resource",
            IngestError::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_display_names_url() {
        let e = IngestError::Fetch {
            url: "https://example.test/prism.zip".into(),
            reason: "HTTP 503 Service Unavailable".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("https://example.test/prism.zip"), "got: {msg}");
        assert!(msg.contains("503"));
    }

    #[test]
    fn timestamp_display_quotes_header() {
        let e = IngestError::Timestamp {
            header: "".into(),
            reason: "premature end of input".into(),
        };
        assert!(e.to_string().contains("\"\""));
    }

    #[test]
    fn conversion_display_carries_diagnostics() {
        let e = IngestError::Conversion {
            stage: "relational",
            detail: "exit status: 1, output: corrupt header".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("relational"));
        assert!(msg.contains("corrupt header"));
    }

    #[test]
    fn not_found_display() {
        let e = IngestError::NotFound {
            entry: "prism.mdb".into(),
            detail: "archive has 3 entries".into(),
        };
        assert!(e.to_string().contains("prism.mdb"));
    }

    #[test]
    fn resource_keeps_io_source() {
        use std::error::Error;
        let e = IngestError::Resource {
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        assert!(e.source().is_some());
    }

    #[test]
    fn kinds_are_stable() {
        assert_eq!(
            IngestError::Internal("x".into()).kind(),
            "internal"
        );
        assert_eq!(
            IngestError::Store {
                key: "k".into(),
                reason: "r".into()
            }
            .kind(),
            "store"
        );
    }
}
