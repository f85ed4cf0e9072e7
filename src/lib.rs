//! # prism-fetch
//!
//! Scheduled ingestion service for the NZ radio-spectrum PRISM database.
//!
//! ## What it does
//!
//! Radio Spectrum Management publishes the PRISM licence database as a ZIP
//! archive containing a proprietary Access database. Each trigger of this
//! service fetches the archive, converts the database through a chain of
//! external tools, and publishes every artifact to object storage, or
//! does nothing at all when the current upstream version has already been
//! processed.
//!
//! ## Pipeline Overview
//!
//! ```text
//! trigger (HTTP)
//!  │
//!  ├─ 1. Fetch    GET the archive, read Last-Modified as the version
//!  ├─ 2. Dedup    structured record for this version exists? → done
//!  ├─ 3. Publish  raw archive  → prism.zip/<version>
//!  ├─ 4. Extract  prism.mdb out of the archive to a staging file
//!  ├─ 5. Convert  mdb → sqlite (external jar) + analyze pass
//!  ├─ 6. Convert  sqlite → csv (fixed extraction query)
//!  ├─ 7. Publish  tabular      → prism.csv/<version>
//!  ├─ 8. Convert  csv → json (structuring script)
//!  └─ 9. Publish  structured   → prism.json/<version>, prism.json/latest
//! ```
//!
//! Every stage failure is fatal to the run; the external scheduler simply
//! triggers again later, and step 2 makes completed versions free to
//! re-trigger.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use prism_fetch::{IngestConfig, Ingestor, MemoryStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = IngestConfig::default();
//!     let ingestor = Arc::new(Ingestor::new(config, Arc::new(MemoryStore::new())));
//!     prism_fetch::server::serve(ingestor).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `prism-fetchd` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when embedding the library to avoid pulling in CLI-only
//! deps:
//! ```toml
//! prism-fetch = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod ingest;
pub mod keys;
pub mod output;
pub mod pipeline;
pub mod server;
pub mod staging;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::IngestConfig;
pub use error::IngestError;
pub use ingest::Ingestor;
pub use output::{RunOutcome, RunReport};
pub use staging::{StagedFile, Staging};
pub use store::{BlobMeta, BlobStore, MemoryStore, ObjectStoreBackend};
