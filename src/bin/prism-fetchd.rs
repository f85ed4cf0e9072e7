//! Service binary for prism-fetch.
//!
//! A thin shim over the library crate that maps CLI flags (with their
//! environment-variable fallbacks) to `IngestConfig`, picks a blob-store
//! backend, and starts the trigger server.

use anyhow::Result;
use clap::Parser;
use prism_fetch::config::{DEFAULT_ARCHIVE_URL, DEFAULT_BUCKET};
use prism_fetch::{BlobStore, IngestConfig, Ingestor, MemoryStore, ObjectStoreBackend};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "prism-fetchd",
    version,
    about = "Fetch the PRISM archive, convert it, and publish the artifacts"
)]
struct Cli {
    /// URL of the archive to fetch.
    #[arg(long, env = "PRISM_ZIP_URL", default_value = DEFAULT_ARCHIVE_URL)]
    prism_zip_url: String,

    /// Target bucket name. A `s3://` prefix selects S3; anything else is
    /// treated as a Google Cloud Storage bucket.
    #[arg(long, env = "BUCKET_NAME", default_value = DEFAULT_BUCKET)]
    bucket_name: String,

    /// Listening port for the trigger endpoint.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Name of the database entry expected inside the archive.
    #[arg(long, default_value = "prism.mdb")]
    database_entry: String,

    /// Java runtime for the MDB converter.
    #[arg(long, default_value = "/usr/bin/java")]
    java_program: PathBuf,

    /// Path to the mdb-sqlite converter jar.
    #[arg(long, default_value = "mdb-sqlite.jar")]
    mdb_converter_jar: PathBuf,

    /// sqlite3 binary for the analyze pass and the tabular extract.
    #[arg(long, default_value = "/usr/bin/sqlite3")]
    sqlite_program: PathBuf,

    /// Python runtime for the structuring converter.
    #[arg(long, default_value = "/usr/bin/python3")]
    python_program: PathBuf,

    /// CSV-to-JSON structuring script.
    #[arg(long, default_value = "csv2json2.py")]
    structuring_script: PathBuf,

    /// SQL file with the fixed extraction query.
    #[arg(long, default_value = "select_point_to_point_links.sql")]
    extraction_query: PathBuf,

    /// Use the in-memory store instead of object storage (local dev only;
    /// nothing survives a restart).
    #[arg(long)]
    memory_store: bool,
}

impl Cli {
    fn into_config(self) -> IngestConfig {
        IngestConfig {
            archive_url: self.prism_zip_url,
            bucket: self.bucket_name,
            database_entry: self.database_entry,
            http_port: self.port,
            java_program: self.java_program,
            mdb_converter_jar: self.mdb_converter_jar,
            sqlite_program: self.sqlite_program,
            python_program: self.python_program,
            structuring_script: self.structuring_script,
            extraction_query: self.extraction_query,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let use_memory = cli.memory_store;
    let config = cli.into_config();
    config.validate()?;

    let store: Arc<dyn BlobStore> = if use_memory {
        tracing::warn!("using in-memory storage backend; published artifacts will not persist");
        Arc::new(MemoryStore::new())
    } else {
        let backend = ObjectStoreBackend::from_bucket(&config.bucket)?;
        tracing::info!(bucket = %backend.bucket(), "using object storage backend");
        Arc::new(backend)
    };

    tracing::info!("fetch server started");
    prism_fetch::server::serve(Arc::new(Ingestor::new(config, store))).await?;
    Ok(())
}
