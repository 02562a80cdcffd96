//! Storage provider contract and backend implementations.
//!
//! One implementation exists per storage technology. All of them satisfy
//! [`CloudStorageProvider`], so the orchestrator never branches on the
//! concrete backend. Backends normalize their native semantics here:
//! not-found conditions map to `AppError::NotFound`, delete is idempotent,
//! and continuation tokens are opaque backend-specific strings.

pub mod azure;
pub mod filesystem;
pub mod gcs;
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use futures::StreamExt;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, Result};

/// Streamed object payload
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// HTTP verb a presigned URL is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            other => Err(AppError::Validation(format!(
                "Unsupported presign method: {}",
                other
            ))),
        }
    }
}

/// Normalized metadata written alongside an object
#[derive(Debug, Clone, Default)]
pub struct ObjectMetadata {
    /// Declared MIME type
    pub content_type: Option<String>,
    /// Free-form key/value attributes
    pub attributes: HashMap<String, String>,
}

impl ObjectMetadata {
    pub fn with_content_type(content_type: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type.into()),
            attributes: HashMap::new(),
        }
    }
}

/// One entry of an object listing
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub key: String,
    pub size_bytes: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub etag: Option<String>,
}

/// One page of an object listing
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    pub objects: Vec<ObjectInfo>,
    /// Opaque cursor for the next page; callers must never parse it
    pub next_token: Option<String>,
    pub is_truncated: bool,
}

/// Per-key failure in a batch delete
#[derive(Debug, Clone)]
pub struct FailedDelete {
    pub key: String,
    pub error: String,
}

/// Partitioned result of a batch delete; one bad key never fails the batch
#[derive(Debug, Clone, Default)]
pub struct BatchDeleteOutcome {
    pub deleted: Vec<String>,
    pub failed: Vec<FailedDelete>,
}

/// Usage statistics for one bucket
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageUsage {
    pub object_count: u64,
    pub total_bytes: u64,
}

/// Capability contract implemented by every storage backend.
///
/// Providers are constructed once at process start and shared across all
/// concurrent requests; implementations hold only connection handles and
/// credentials, never per-request mutable state.
#[async_trait]
pub trait CloudStorageProvider: Send + Sync {
    /// Provider tag ("filesystem", "s3", "gcs", "azure")
    fn name(&self) -> &'static str;

    /// Write an object. Overwrites silently at the backend level; path
    /// uniqueness is enforced by the metadata store.
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        content: Bytes,
        metadata: &ObjectMetadata,
    ) -> Result<()>;

    /// Read an object fully into memory
    async fn download(&self, bucket: &str, key: &str) -> Result<Bytes>;

    /// Read an object as a stream of chunks.
    ///
    /// The default buffers the whole object and yields it as one chunk;
    /// backends with a native streaming read override this.
    async fn download_stream(&self, bucket: &str, key: &str) -> Result<ByteStream> {
        let content = self.download(bucket, key).await?;
        Ok(futures::stream::once(async move { Ok(content) }).boxed())
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool>;

    /// Delete an object. Deleting an absent object is not an error.
    async fn delete(&self, bucket: &str, key: &str) -> Result<()>;

    async fn copy(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<()>;

    /// Move an object. Default is copy-then-delete for backends without an
    /// atomic rename primitive.
    async fn rename(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<()> {
        self.copy(src_bucket, src_key, dst_bucket, dst_key).await?;
        self.delete(src_bucket, src_key).await
    }

    /// Paginated listing. `token` is the opaque cursor returned by a prior
    /// page, if any.
    async fn list(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        token: Option<&str>,
        max_keys: usize,
    ) -> Result<ObjectPage>;

    /// Generate a time-limited URL for direct access to one object
    async fn presign(
        &self,
        bucket: &str,
        key: &str,
        method: HttpMethod,
        expires_in: Duration,
    ) -> Result<String>;

    async fn create_bucket(&self, bucket: &str) -> Result<()>;

    async fn delete_bucket(&self, bucket: &str) -> Result<()>;

    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    async fn list_buckets(&self) -> Result<Vec<String>>;

    /// Delete many objects, reporting per-key success and failure.
    ///
    /// The default issues per-key deletes; backends with a native batch
    /// primitive may override.
    async fn delete_batch(&self, bucket: &str, keys: &[String]) -> Result<BatchDeleteOutcome> {
        let mut outcome = BatchDeleteOutcome::default();
        for key in keys {
            match self.delete(bucket, key).await {
                Ok(()) => outcome.deleted.push(key.clone()),
                Err(e) => outcome.failed.push(FailedDelete {
                    key: key.clone(),
                    error: e.to_string(),
                }),
            }
        }
        Ok(outcome)
    }

    /// Aggregate object count and byte total for a bucket
    async fn usage(&self, bucket: &str) -> Result<StorageUsage> {
        let mut usage = StorageUsage::default();
        let mut token: Option<String> = None;
        loop {
            let page = self.list(bucket, None, token.as_deref(), 1000).await?;
            usage.object_count += page.objects.len() as u64;
            usage.total_bytes += page.objects.iter().map(|o| o.size_bytes).sum::<u64>();
            match page.next_token {
                Some(t) if page.is_truncated => token = Some(t),
                _ => break,
            }
        }
        Ok(usage)
    }

    /// Connectivity check
    async fn health_check(&self) -> Result<()>;
}

/// Construct the configured provider.
///
/// Selected once at startup; the orchestrator only ever sees the trait
/// object.
pub async fn create_provider(config: &Config) -> Result<Arc<dyn CloudStorageProvider>> {
    if config.virus_scan_enabled || config.replication_enabled {
        tracing::info!(
            virus_scan = config.virus_scan_enabled,
            replication = config.replication_enabled,
            "Extension flags set; no handler is registered for them in this build"
        );
    }

    let provider: Arc<dyn CloudStorageProvider> = match config.storage_provider.as_str() {
        "filesystem" => Arc::new(filesystem::FilesystemProvider::new(&config.storage_path).await?),
        "s3" => Arc::new(s3::S3Provider::new(s3::S3ProviderConfig::from_config(
            config,
        )?)?),
        "gcs" => Arc::new(gcs::GcsProvider::new(gcs::GcsConfig::from_config(config)?)?),
        "azure" => Arc::new(azure::AzureProvider::new(azure::AzureConfig::from_config(
            config,
        )?)?),
        other => {
            return Err(AppError::Config(format!(
                "Unknown storage provider: {}",
                other
            )))
        }
    };

    tracing::info!(provider = provider.name(), "Storage provider initialized");
    Ok(provider)
}
