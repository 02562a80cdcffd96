//! S3 storage provider using the rust-s3 crate.
//!
//! Supports AWS S3 and S3-compatible services (MinIO, etc.).
//! Configuration via environment variables:
//! - S3_REGION: AWS region (default: us-east-1)
//! - S3_ENDPOINT: Custom endpoint URL for S3-compatible services
//! - AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY: optional if using
//!   instance roles/IRSA
//!
//! Bucket handles are built per call; construction is pure string work, so
//! the provider stays free of per-request mutable state.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::region::Region;
use std::time::Duration;

use super::{
    CloudStorageProvider, HttpMethod, ObjectInfo, ObjectMetadata, ObjectPage,
};
use crate::config::Config;
use crate::error::{AppError, Result};

// S3 rejects presigned URLs that outlive 7 days
const MAX_PRESIGN_SECS: u64 = 604_800;

/// S3 provider configuration
#[derive(Debug, Clone)]
pub struct S3ProviderConfig {
    /// AWS region
    pub region: String,
    /// Custom endpoint URL (for MinIO compatibility)
    pub endpoint: Option<String>,
}

impl S3ProviderConfig {
    /// Extract the S3 section from the application config
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            region: config
                .s3_region
                .clone()
                .unwrap_or_else(|| "us-east-1".into()),
            endpoint: config.s3_endpoint.clone(),
        })
    }
}

/// S3-compatible storage provider
pub struct S3Provider {
    credentials: Credentials,
    region: Region,
    use_path_style: bool,
}

impl S3Provider {
    /// Create the provider from configuration.
    ///
    /// Credentials come from the default chain: env vars, shared
    /// credentials file, container credentials, instance metadata.
    pub fn new(config: S3ProviderConfig) -> Result<Self> {
        let credentials = Credentials::default()
            .map_err(|e| AppError::Config(format!("Failed to load AWS credentials: {}", e)))?;

        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .region
                .parse()
                .map_err(|_| AppError::Config(format!("Invalid S3 region: {}", config.region)))?,
        };

        // Path-style addressing for custom endpoints (MinIO)
        let use_path_style = config.endpoint.is_some();

        Ok(Self {
            credentials,
            region,
            use_path_style,
        })
    }

    fn bucket_handle(&self, bucket: &str) -> Result<Box<Bucket>> {
        let handle = Bucket::new(bucket, self.region.clone(), self.credentials.clone())
            .map_err(|e| AppError::Config(format!("Failed to create S3 bucket handle: {}", e)))?;
        Ok(if self.use_path_style {
            handle.with_path_style()
        } else {
            handle
        })
    }
}

fn is_not_found(err_str: &str) -> bool {
    err_str.contains("404") || err_str.contains("NoSuchKey") || err_str.contains("Not Found")
}

#[async_trait]
impl CloudStorageProvider for S3Provider {
    fn name(&self) -> &'static str {
        "s3"
    }

    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        content: Bytes,
        metadata: &ObjectMetadata,
    ) -> Result<()> {
        let handle = self.bucket_handle(bucket)?;

        let result = match &metadata.content_type {
            Some(content_type) => {
                handle
                    .put_object_with_content_type(key, &content, content_type)
                    .await
            }
            None => handle.put_object(key, &content).await,
        };
        result.map_err(|e| AppError::Storage(format!("Failed to put object '{}': {}", key, e)))?;

        tracing::debug!(bucket = %bucket, key = %key, "S3 put object successful");
        Ok(())
    }

    async fn download(&self, bucket: &str, key: &str) -> Result<Bytes> {
        let handle = self.bucket_handle(bucket)?;

        let response = handle.get_object(key).await.map_err(|e| {
            let err_str = e.to_string();
            if is_not_found(&err_str) {
                AppError::NotFound(format!("Object not found: {}/{}", bucket, key))
            } else {
                AppError::Storage(format!("Failed to get object '{}': {}", key, e))
            }
        })?;

        tracing::debug!(bucket = %bucket, key = %key, size = response.bytes().len(), "S3 get object successful");
        Ok(Bytes::from(response.to_vec()))
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        let handle = self.bucket_handle(bucket)?;

        match handle.head_object(key).await {
            Ok(_) => Ok(true),
            Err(e) => {
                let err_str = e.to_string();
                if is_not_found(&err_str) {
                    Ok(false)
                } else {
                    Err(AppError::Storage(format!(
                        "Failed to check existence of '{}': {}",
                        key, e
                    )))
                }
            }
        }
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        let handle = self.bucket_handle(bucket)?;

        // S3 DeleteObject is already idempotent; absent keys return 204
        match handle.delete_object(key).await {
            Ok(_) => {
                tracing::debug!(bucket = %bucket, key = %key, "S3 delete object successful");
                Ok(())
            }
            Err(e) if is_not_found(&e.to_string()) => Ok(()),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to delete object '{}': {}",
                key, e
            ))),
        }
    }

    async fn copy(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<()> {
        let handle = self.bucket_handle(dst_bucket)?;

        // S3 CopyObject wants the source in "bucket/key" form
        let copy_source = format!("{}/{}", src_bucket, src_key);
        handle
            .copy_object_internal(&copy_source, dst_key)
            .await
            .map_err(|e| {
                let err_str = e.to_string();
                if is_not_found(&err_str) {
                    AppError::NotFound(format!("Object not found: {}/{}", src_bucket, src_key))
                } else {
                    AppError::Storage(format!(
                        "Failed to copy '{}' to '{}': {}",
                        src_key, dst_key, e
                    ))
                }
            })?;

        tracing::debug!(source = %src_key, dest = %dst_key, "S3 copy object successful");
        Ok(())
    }

    async fn list(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        token: Option<&str>,
        max_keys: usize,
    ) -> Result<ObjectPage> {
        let handle = self.bucket_handle(bucket)?;

        let (result, _code) = handle
            .list_page(
                prefix.unwrap_or_default().to_string(),
                None,
                token.map(String::from),
                None,
                Some(max_keys.clamp(1, 1000)),
            )
            .await
            .map_err(|e| AppError::Storage(format!("Failed to list objects: {}", e)))?;

        let objects = result
            .contents
            .into_iter()
            .map(|obj| ObjectInfo {
                size_bytes: obj.size,
                last_modified: DateTime::parse_from_rfc3339(&obj.last_modified)
                    .ok()
                    .map(|t| t.with_timezone(&Utc)),
                etag: obj.e_tag.clone(),
                key: obj.key,
            })
            .collect::<Vec<_>>();

        tracing::debug!(bucket = %bucket, prefix = ?prefix, count = objects.len(), "S3 list objects successful");
        Ok(ObjectPage {
            objects,
            // Native S3 cursor, passed through untouched
            next_token: result.next_continuation_token,
            is_truncated: result.is_truncated,
        })
    }

    async fn presign(
        &self,
        bucket: &str,
        key: &str,
        method: HttpMethod,
        expires_in: Duration,
    ) -> Result<String> {
        let handle = self.bucket_handle(bucket)?;
        let expiry_secs = expires_in.as_secs().min(MAX_PRESIGN_SECS) as u32;

        let url = match method {
            HttpMethod::Get => handle.presign_get(key, expiry_secs, None).await,
            HttpMethod::Put => handle.presign_put(key, expiry_secs, None, None).await,
            HttpMethod::Delete => handle.presign_delete(key, expiry_secs).await,
        }
        .map_err(|e| {
            AppError::Storage(format!(
                "Failed to generate presigned URL for '{}': {}",
                key, e
            ))
        })?;

        tracing::debug!(
            bucket = %bucket,
            key = %key,
            method = %method,
            expires_in_secs = expiry_secs,
            "Generated S3 presigned URL"
        );
        Ok(url)
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        let response = if self.use_path_style {
            Bucket::create_with_path_style(
                bucket,
                self.region.clone(),
                self.credentials.clone(),
                s3::BucketConfiguration::default(),
            )
            .await
        } else {
            Bucket::create(
                bucket,
                self.region.clone(),
                self.credentials.clone(),
                s3::BucketConfiguration::default(),
            )
            .await
        }
        .map_err(|e| AppError::Storage(format!("Failed to create bucket '{}': {}", bucket, e)))?;

        if !response.success() {
            return Err(AppError::Storage(format!(
                "Failed to create bucket '{}': {}",
                bucket, response.response_text
            )));
        }
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        let handle = self.bucket_handle(bucket)?;
        handle
            .delete()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to delete bucket '{}': {}", bucket, e)))?;
        Ok(())
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        let handle = self.bucket_handle(bucket)?;
        handle
            .exists()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to check bucket '{}': {}", bucket, e)))
    }

    async fn list_buckets(&self) -> Result<Vec<String>> {
        let response = Bucket::list_buckets(self.region.clone(), self.credentials.clone())
            .await
            .map_err(|e| AppError::Storage(format!("Failed to list buckets: {}", e)))?;
        Ok(response.bucket_names().collect())
    }

    async fn health_check(&self) -> Result<()> {
        // A ListBuckets round trip verifies both connectivity and credentials
        Bucket::list_buckets(self.region.clone(), self.credentials.clone())
            .await
            .map_err(|e| AppError::Storage(format!("S3 health check failed: {}", e)))?;
        Ok(())
    }
}
