//! Archive handling: locate the database entry and materialise it to disk.
//!
//! ## Why spawn_blocking?
//!
//! Inflating a multi-megabyte entry is CPU-bound and the `zip` crate's
//! readers are synchronous. `tokio::task::spawn_blocking` keeps the
//! decompression off the async worker threads, the same way the CPU-heavy
//! stages of any pipeline should run.
//!
//! ## Why a real file?
//!
//! The downstream relational converter takes a file path argument (it
//! cannot read the database from a pipe), so the entry is written to a
//! staging file owned by the run's [`crate::staging::Staging`] area.

use crate::error::IngestError;
use bytes::Bytes;
use std::io::Cursor;
use std::path::Path;
use tracing::info;
use zip::result::ZipError;
use zip::ZipArchive;

/// Extracts the named entry from the archive bytes into `dest`.
///
/// Returns the number of bytes written.
///
/// # Errors
///
/// * [`IngestError::NotFound`] — the archive cannot be opened or holds no
///   entry with the expected name. Both indicate an upstream format
///   change; neither is retryable in-process.
/// * [`IngestError::Resource`] — the staging file could not be written.
pub async fn extract_database(
    bytes: Bytes,
    entry_name: &str,
    dest: &Path,
) -> Result<u64, IngestError> {
    let entry = entry_name.to_string();
    let dest = dest.to_path_buf();

    let written = tokio::task::spawn_blocking(move || extract_blocking(&bytes, &entry, &dest))
        .await
        .map_err(|e| IngestError::Internal(format!("extract task panicked: {e}")))??;

    info!("read {written} bytes from {entry_name}");
    Ok(written)
}

fn extract_blocking(bytes: &[u8], entry_name: &str, dest: &Path) -> Result<u64, IngestError> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| IngestError::NotFound {
            entry: entry_name.to_string(),
            detail: format!("couldn't open archive: {e}"),
        })?;
    let entry_count = archive.len();

    let mut entry = match archive.by_name(entry_name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => {
            return Err(IngestError::NotFound {
                entry: entry_name.to_string(),
                detail: format!("archive holds {entry_count} entries, none match"),
            });
        }
        Err(e) => {
            return Err(IngestError::NotFound {
                entry: entry_name.to_string(),
                detail: e.to_string(),
            });
        }
    };

    let mut out =
        std::fs::File::create(dest).map_err(|source| IngestError::Resource { source })?;
    std::io::copy(&mut entry, &mut out).map_err(|source| IngestError::Resource { source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn archive_with(entries: &[(&str, &[u8])]) -> Bytes {
        let buf = Cursor::new(Vec::new());
        let mut writer = ZipWriter::new(buf);
        for (name, data) in entries {
            writer
                .start_file(*name, FileOptions::default())
                .expect("start entry");
            writer.write_all(data).expect("write entry");
        }
        Bytes::from(writer.finish().expect("finish archive").into_inner())
    }

    #[tokio::test]
    async fn extracts_the_named_entry() {
        let bytes = archive_with(&[
            ("readme.txt", b"ignore me"),
            ("prism.mdb", b"database-payload"),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("prism.mdb");

        let written = extract_database(bytes, "prism.mdb", &dest).await.unwrap();

        assert_eq!(written, b"database-payload".len() as u64);
        assert_eq!(std::fs::read(&dest).unwrap(), b"database-payload");
    }

    #[tokio::test]
    async fn missing_entry_reports_not_found_with_count() {
        let bytes = archive_with(&[("other.txt", b"x"), ("also.txt", b"y")]);
        let dir = tempfile::tempdir().unwrap();

        let err = extract_database(bytes, "prism.mdb", &dir.path().join("out"))
            .await
            .expect_err("should fail");

        match err {
            IngestError::NotFound { entry, detail } => {
                assert_eq!(entry, "prism.mdb");
                assert!(detail.contains("2 entries"), "got: {detail}");
            }
            other => panic!("expected NotFound, got: {other}"),
        }
    }

    #[tokio::test]
    async fn garbage_bytes_report_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_database(
            Bytes::from_static(b"this is not a zip"),
            "prism.mdb",
            &dir.path().join("out"),
        )
        .await
        .expect_err("should fail");

        match err {
            IngestError::NotFound { detail, .. } => {
                assert!(detail.contains("couldn't open archive"), "got: {detail}");
            }
            other => panic!("expected NotFound, got: {other}"),
        }
    }
}
