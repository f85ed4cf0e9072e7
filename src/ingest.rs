//! The pipeline orchestrator: one trigger, one end-to-end run.
//!
//! A run is a strict sequence (fetch, dedup check, extract, convert,
//! convert, publish) with no internal parallelism and no in-process
//! retry. The first failure aborts the run; the external scheduler simply
//! triggers again on its next interval, and the dedup check makes re-runs
//! of an already-published version cheap no-ops.
//!
//! ## Partial failure
//!
//! Publication records are written in a fixed order: raw archive, tabular
//! extract, timestamped structured output, `latest` alias. The timestamped
//! structured record is the durability marker the dedup check probes, so a
//! crash anywhere before it leaves the version looking unprocessed and the
//! next run redoes the work; duplicated intermediate writes are accepted,
//! not an error. The `latest` alias is written after the marker, so it
//! never points at output whose timestamped counterpart is missing.

use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::keys;
use crate::output::{RunOutcome, RunReport};
use crate::pipeline::{archive, convert, fetch};
use crate::staging::Staging;
use crate::store::BlobStore;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Executes ingestion runs against one origin and one blob store.
///
/// Construct once at process start with the fully-built configuration;
/// the pipeline never consults ambient process-wide state.
pub struct Ingestor {
    config: IngestConfig,
    store: Arc<dyn BlobStore>,
    client: reqwest::Client,
}

impl std::fmt::Debug for Ingestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ingestor")
            .field("config", &self.config)
            .field("store", &"<BlobStore>")
            .finish()
    }
}

impl Ingestor {
    /// Creates an ingestor over the given configuration and store.
    pub fn new(config: IngestConfig, store: Arc<dyn BlobStore>) -> Self {
        Self {
            config,
            store,
            client: reqwest::Client::new(),
        }
    }

    /// The configuration this ingestor runs with.
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// The blob store this ingestor publishes into.
    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    /// Executes one end-to-end ingestion run.
    ///
    /// # Errors
    ///
    /// The first fatal [`IngestError`] from any stage. All staging files
    /// are removed before the error propagates, on every exit path.
    pub async fn run(&self) -> Result<RunOutcome, IngestError> {
        let started = Instant::now();

        // ── Step 1: fetch + version marker ───────────────────────────────
        let fetched = fetch::fetch_archive(&self.client, &self.config.archive_url).await?;
        let version = fetched.version();

        // ── Step 2: dedup check ──────────────────────────────────────────
        if self.store.exists(&keys::structured(&version)).await? {
            info!("version {version} already published, skipping run");
            return Ok(RunOutcome::AlreadyCurrent { version });
        }

        let mut records = Vec::with_capacity(4);
        let archive_bytes = fetched.bytes.len() as u64;

        // ── Step 3: raw-archive audit copy ───────────────────────────────
        // Written before the archive is even opened, so a historical
        // version can be replayed after the origin purges it.
        self.publish(keys::raw_archive(&version), fetched.bytes.clone(), &mut records)
            .await?;

        // ── Steps 4–5: locate + materialise the database entry ───────────
        let staging = Staging::new()?;
        let database = staging.acquire(&self.config.database_entry)?;
        archive::extract_database(
            fetched.bytes.clone(),
            &self.config.database_entry,
            database.path(),
        )
        .await?;

        // ── Step 6: relational conversion + analyze pass ─────────────────
        let sqlite = staging.acquire("prism.sqlite3")?;
        convert::relational_to_sqlite(&self.config, database.path(), sqlite.path()).await?;

        // ── Step 7: tabular extraction ───────────────────────────────────
        let tabular = convert::extract_tabular(&self.config, sqlite.path()).await?;

        // ── Step 8: tabular record ───────────────────────────────────────
        self.publish(keys::tabular(&version), tabular.clone(), &mut records)
            .await?;

        // ── Step 9: structuring ──────────────────────────────────────────
        let structured = convert::structure_records(&self.config, tabular).await?;

        // ── Step 10: durability marker, then the alias ───────────────────
        self.publish(keys::structured(&version), structured.clone(), &mut records)
            .await?;
        self.publish(keys::structured_latest(), structured, &mut records)
            .await?;

        let report = RunReport {
            version,
            archive_bytes,
            records,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            "published version {} ({} records, {}ms)",
            report.version,
            report.records.len(),
            report.duration_ms
        );
        Ok(RunOutcome::Published(report))
    }

    async fn publish(
        &self,
        key: String,
        data: Bytes,
        records: &mut Vec<String>,
    ) -> Result<(), IngestError> {
        let size = self.store.put(&key, data).await?;
        info!("wrote {size} bytes to {key}");
        records.push(key);
        Ok(())
    }
}
