//! Blob-store abstraction over durable object storage.
//!
//! The pipeline only needs an existence check, a whole-object write, and a
//! metadata read, so the trait is deliberately that narrow.
//! [`ObjectStoreBackend`] adapts the `object_store` crate (GCS in
//! production, S3 via an `s3://` bucket prefix); [`MemoryStore`] backs
//! tests and local development.
//!
//! Write semantics: a `put` either commits the whole object or fails with
//! no readable object left at the key. Both backends satisfy this: object
//! stores commit on close, and the memory map inserts atomically.

use crate::error::IngestError;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use object_store::path::Path as StorePath;
use object_store::ObjectStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Metadata about a stored object.
#[derive(Debug, Clone)]
pub struct BlobMeta {
    /// Object key.
    pub key: String,
    /// Object size in bytes.
    pub size: u64,
    /// Last modification timestamp, when the backend reports one.
    pub last_modified: Option<DateTime<Utc>>,
}

/// Durable object-storage operations used by the pipeline.
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Returns whether an object exists at `key`.
    ///
    /// A missing object is a normal `false`; only genuine backend failures
    /// return [`IngestError::Store`].
    async fn exists(&self, key: &str) -> Result<bool, IngestError>;

    /// Writes a whole object, returning the committed size in bytes.
    ///
    /// Overwrites any existing object at `key`; the orchestrator is
    /// responsible for never re-putting a timestamped key it knows exists.
    async fn put(&self, key: &str, data: Bytes) -> Result<u64, IngestError>;

    /// Reads object metadata without fetching content.
    async fn head(&self, key: &str) -> Result<Option<BlobMeta>, IngestError>;
}

// ── object_store adapter ─────────────────────────────────────────────────

/// [`BlobStore`] over any `object_store` backend.
pub struct ObjectStoreBackend {
    inner: Arc<dyn ObjectStore>,
    bucket: String,
}

impl std::fmt::Debug for ObjectStoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStoreBackend")
            .field("bucket", &self.bucket)
            .finish()
    }
}

impl ObjectStoreBackend {
    /// Wraps an already-constructed `object_store` backend.
    pub fn new(inner: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            inner,
            bucket: bucket.into(),
        }
    }

    /// Builds a backend from a bucket identifier.
    ///
    /// `s3://name` or `s3a://name` selects S3; anything else (including a
    /// `gs://` prefix or a bare name) selects GCS, matching where the
    /// archive is actually published. Credentials come from the ambient
    /// environment in both cases.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Store`] when the backend cannot be built
    /// (e.g. malformed bucket name).
    pub fn from_bucket(bucket: &str) -> Result<Self, IngestError> {
        let bucket = bucket.trim();
        let store_err = |e: object_store::Error| IngestError::Store {
            key: bucket.to_string(),
            reason: e.to_string(),
        };

        if let Some(name) = bucket
            .strip_prefix("s3://")
            .or_else(|| bucket.strip_prefix("s3a://"))
        {
            let inner = object_store::aws::AmazonS3Builder::from_env()
                .with_bucket_name(name)
                .build()
                .map_err(store_err)?;
            Ok(Self::new(Arc::new(inner), name))
        } else {
            let name = bucket.strip_prefix("gs://").unwrap_or(bucket);
            let inner = object_store::gcp::GoogleCloudStorageBuilder::from_env()
                .with_bucket_name(name)
                .build()
                .map_err(store_err)?;
            Ok(Self::new(Arc::new(inner), name))
        }
    }

    /// The bucket this backend writes into.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl BlobStore for ObjectStoreBackend {
    async fn exists(&self, key: &str) -> Result<bool, IngestError> {
        Ok(self.head(key).await?.is_some())
    }

    async fn put(&self, key: &str, data: Bytes) -> Result<u64, IngestError> {
        let size = data.len() as u64;
        self.inner
            .put(&StorePath::from(key), data.into())
            .await
            .map_err(|e| IngestError::Store {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        Ok(size)
    }

    async fn head(&self, key: &str) -> Result<Option<BlobMeta>, IngestError> {
        match self.inner.head(&StorePath::from(key)).await {
            Ok(meta) => Ok(Some(BlobMeta {
                key: key.to_string(),
                size: meta.size as u64,
                last_modified: Some(meta.last_modified),
            })),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(IngestError::Store {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

// ── In-memory backend ────────────────────────────────────────────────────

/// In-memory [`BlobStore`] for tests and local development.
///
/// Thread-safe via `RwLock`; also counts writes so idempotence tests can
/// assert that a short-circuited run issued none.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<String, StoredBlob>>,
    writes: AtomicU64,
}

#[derive(Debug, Clone)]
struct StoredBlob {
    data: Bytes,
    last_modified: DateTime<Utc>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `put` calls observed since construction.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Content stored at `key`, if any.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.objects
            .read()
            .ok()?
            .get(key)
            .map(|blob| blob.data.clone())
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .read()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    fn lock_err(key: &str) -> IngestError {
        IngestError::Store {
            key: key.to_string(),
            reason: "lock poisoned".to_string(),
        }
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn exists(&self, key: &str) -> Result<bool, IngestError> {
        let objects = self.objects.read().map_err(|_| Self::lock_err(key))?;
        Ok(objects.contains_key(key))
    }

    async fn put(&self, key: &str, data: Bytes) -> Result<u64, IngestError> {
        let size = data.len() as u64;
        let mut objects = self.objects.write().map_err(|_| Self::lock_err(key))?;
        self.writes.fetch_add(1, Ordering::Relaxed);
        objects.insert(
            key.to_string(),
            StoredBlob {
                data,
                last_modified: Utc::now(),
            },
        );
        Ok(size)
    }

    async fn head(&self, key: &str) -> Result<Option<BlobMeta>, IngestError> {
        let objects = self.objects.read().map_err(|_| Self::lock_err(key))?;
        Ok(objects.get(key).map(|blob| BlobMeta {
            key: key.to_string(),
            size: blob.data.len() as u64,
            last_modified: Some(blob.last_modified),
        }))
    }
}
