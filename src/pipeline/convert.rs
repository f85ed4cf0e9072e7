//! External converter invocation.
//!
//! The format converters are existing tools, not libraries: an MDB-to-SQLite
//! jar, the `sqlite3` shell, and a CSV-to-JSON script. Each is crossed via
//! one process boundary with an explicit contract: input locations as
//! arguments or stdin, output as a file or stdout, and a zero exit status
//! as the only success signal. No output is trusted without that signal.
//!
//! All three converters funnel through [`run_stage`], which owns the
//! spawn/feed/capture/translate sequence, so the exit-status handling and
//! diagnostic capture cannot drift apart between stages.

use crate::config::IngestConfig;
use crate::error::IngestError;
use bytes::Bytes;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

/// Converts the extracted database file into a SQLite file, then runs the
/// analyze pass in place so the extraction query has fresh statistics.
///
/// # Errors
///
/// [`IngestError::Conversion`] with the subprocess's combined output.
pub async fn relational_to_sqlite(
    config: &IngestConfig,
    database: &Path,
    sqlite: &Path,
) -> Result<(), IngestError> {
    info!(
        "converting {} to sqlite at {}",
        database.display(),
        sqlite.display()
    );
    let mut convert = Command::new(&config.java_program);
    convert
        .arg("-jar")
        .arg(&config.mdb_converter_jar)
        .arg(database)
        .arg(sqlite);
    run_stage("relational", &mut convert, None).await?;

    let mut analyze = Command::new(&config.sqlite_program);
    analyze.arg(sqlite).arg("analyze main;");
    run_stage("relational", &mut analyze, None).await?;
    Ok(())
}

/// Runs the fixed extraction query against the SQLite file, capturing the
/// tabular output.
///
/// The query text lives in a deployment-supplied file and is fed to the
/// converter on stdin.
///
/// # Errors
///
/// [`IngestError::Conversion`] on a failed run or an unreadable query file.
pub async fn extract_tabular(
    config: &IngestConfig,
    sqlite: &Path,
) -> Result<Bytes, IngestError> {
    let query = tokio::fs::read(&config.extraction_query)
        .await
        .map_err(|e| IngestError::Conversion {
            stage: "tabular",
            detail: format!(
                "couldn't read extraction query {}: {e}",
                config.extraction_query.display()
            ),
        })?;

    info!("extracting tabular data from {}", sqlite.display());
    let mut cmd = Command::new(&config.sqlite_program);
    cmd.arg(sqlite);
    let csv = run_stage("tabular", &mut cmd, Some(Bytes::from(query))).await?;
    Ok(Bytes::from(csv))
}

/// Feeds the tabular extract to the structuring converter, capturing the
/// structured output.
///
/// # Errors
///
/// [`IngestError::Conversion`] on a failed run.
pub async fn structure_records(
    config: &IngestConfig,
    tabular: Bytes,
) -> Result<Bytes, IngestError> {
    info!("structuring {} bytes of tabular data", tabular.len());
    let mut cmd = Command::new(&config.python_program);
    cmd.arg(&config.structuring_script);
    let json = run_stage("structuring", &mut cmd, Some(tabular)).await?;
    Ok(Bytes::from(json))
}

/// Spawns one converter stage, optionally feeding stdin, and returns its
/// captured stdout. A non-zero exit (or a spawn failure) is translated to
/// [`IngestError::Conversion`] carrying the captured diagnostics.
async fn run_stage(
    stage: &'static str,
    command: &mut Command,
    stdin: Option<Bytes>,
) -> Result<Vec<u8>, IngestError> {
    debug!("running {stage} converter: {command:?}");
    command
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command.spawn().map_err(|e| IngestError::Conversion {
        stage,
        detail: format!("failed to spawn: {e}"),
    })?;

    if let Some(input) = stdin {
        let mut handle = child
            .stdin
            .take()
            .ok_or_else(|| IngestError::Internal(format!("{stage} stdin not captured")))?;
        // Fed from a separate task so a converter that fills its stdout
        // pipe before consuming all of stdin cannot deadlock the run. A
        // write failure here means the child died; its exit status below
        // is the meaningful diagnostic.
        tokio::spawn(async move {
            let _ = handle.write_all(&input).await;
            // Dropping the handle closes the pipe so the converter sees EOF.
        });
    }

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| IngestError::Conversion {
            stage,
            detail: format!("couldn't collect output: {e}"),
        })?;

    if !output.status.success() {
        return Err(IngestError::Conversion {
            stage,
            detail: format!(
                "{}, output: {}",
                output.status,
                combined_diagnostics(&output)
            ),
        });
    }
    Ok(output.stdout)
}

/// Joins stderr and stdout into one diagnostic string, stderr first.
fn combined_diagnostics(output: &std::process::Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut diag = stderr.trim().to_string();
    if !stdout.trim().is_empty() {
        if !diag.is_empty() {
            diag.push('\n');
        }
        diag.push_str(stdout.trim());
    }
    diag
}
