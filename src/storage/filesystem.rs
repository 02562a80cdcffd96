//! Filesystem storage provider.
//!
//! Buckets are top-level directories beneath the configured root; object
//! keys map to relative paths. Intended for development and single-node
//! deployments, but it satisfies the full provider contract including
//! pagination and pseudo presigned URLs.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use super::{
    ByteStream, CloudStorageProvider, HttpMethod, ObjectInfo, ObjectMetadata, ObjectPage,
    StorageUsage,
};
use crate::error::{AppError, Result};

/// Filesystem-backed provider
pub struct FilesystemProvider {
    base_path: PathBuf,
}

impl FilesystemProvider {
    /// Create the provider, ensuring the root directory exists
    pub async fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).await?;
        Ok(Self { base_path })
    }

    fn bucket_root(&self, bucket: &str) -> PathBuf {
        self.base_path.join(bucket)
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        ensure_key_safe(key)?;
        ensure_bucket_safe(bucket)?;
        Ok(self.bucket_root(bucket).join(key))
    }

    /// Walk a bucket collecting all keys, sorted for stable pagination
    async fn collect_keys(&self, bucket: &str, prefix: Option<&str>) -> Result<Vec<ObjectInfo>> {
        let root = self.bucket_root(bucket);
        if !root.exists() {
            return Err(AppError::NotFound(format!("Bucket not found: {}", bucket)));
        }

        let mut entries_out = Vec::new();
        let mut stack = vec![root.clone()];
        while let Some(current) = stack.pop() {
            let mut entries = fs::read_dir(&current).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                    continue;
                }
                let Ok(relative) = path.strip_prefix(&root) else {
                    continue;
                };
                let key = relative.to_string_lossy().replace('\\', "/");
                if let Some(p) = prefix {
                    if !key.starts_with(p) {
                        continue;
                    }
                }
                let meta = entry.metadata().await?;
                let modified = meta
                    .modified()
                    .ok()
                    .map(|t| DateTime::<Utc>::from(t));
                entries_out.push(ObjectInfo {
                    key,
                    size_bytes: meta.len(),
                    last_modified: modified,
                    etag: None,
                });
            }
        }

        entries_out.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries_out)
    }
}

/// Reject keys that could escape the bucket directory
fn ensure_key_safe(key: &str) -> Result<()> {
    if key.is_empty()
        || key.starts_with('/')
        || key.split('/').any(|seg| seg == "..")
        || key.bytes().any(|b| b.is_ascii_control() || b == b'\0')
    {
        return Err(AppError::Validation(format!("Invalid object key: {}", key)));
    }
    Ok(())
}

fn ensure_bucket_safe(bucket: &str) -> Result<()> {
    if bucket.is_empty() || bucket.contains('/') || bucket.contains("..") {
        return Err(AppError::Validation(format!(
            "Invalid bucket name: {}",
            bucket
        )));
    }
    Ok(())
}

/// Offset cursor, base64-wrapped so callers treat it as opaque
fn encode_token(offset: usize) -> String {
    BASE64.encode(offset.to_string())
}

fn decode_token(token: &str) -> Result<usize> {
    let raw = BASE64
        .decode(token)
        .map_err(|_| AppError::Validation("Invalid continuation token".into()))?;
    String::from_utf8(raw)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| AppError::Validation("Invalid continuation token".into()))
}

#[async_trait]
impl CloudStorageProvider for FilesystemProvider {
    fn name(&self) -> &'static str {
        "filesystem"
    }

    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        content: Bytes,
        _metadata: &ObjectMetadata,
    ) -> Result<()> {
        let path = self.object_path(bucket, key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write atomically via temp file
        let tmp = path.with_extension(format!("tmp-{}", Uuid::new_v4()));
        let mut file = fs::File::create(&tmp).await?;
        if let Err(e) = file.write_all(&content).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp, &path).await?;

        tracing::debug!(bucket = %bucket, key = %key, "Filesystem put successful");
        Ok(())
    }

    async fn download(&self, bucket: &str, key: &str) -> Result<Bytes> {
        let path = self.object_path(bucket, key)?;
        let content = fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::NotFound(format!("Object not found: {}/{}", bucket, key))
            } else {
                AppError::Storage(format!("Failed to read {}: {}", key, e))
            }
        })?;
        Ok(Bytes::from(content))
    }

    async fn download_stream(&self, bucket: &str, key: &str) -> Result<ByteStream> {
        let path = self.object_path(bucket, key)?;
        let file = fs::File::open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::NotFound(format!("Object not found: {}/{}", bucket, key))
            } else {
                AppError::Storage(format!("Failed to open {}: {}", key, e))
            }
        })?;
        Ok(ReaderStream::new(file).boxed())
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        let path = self.object_path(bucket, key)?;
        Ok(path.exists())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to delete {}: {}",
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
        let src = self.object_path(src_bucket, src_key)?;
        let dst = self.object_path(dst_bucket, dst_key)?;

        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::copy(&src, &dst).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::NotFound(format!("Object not found: {}/{}", src_bucket, src_key))
            } else {
                AppError::Storage(format!("Failed to copy {}: {}", src_key, e))
            }
        })?;
        Ok(())
    }

    async fn rename(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<()> {
        let src = self.object_path(src_bucket, src_key)?;
        let dst = self.object_path(dst_bucket, dst_key)?;

        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).await?;
        }
        // Native atomic rename; no copy+delete needed on the filesystem
        fs::rename(&src, &dst).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::NotFound(format!("Object not found: {}/{}", src_bucket, src_key))
            } else {
                AppError::Storage(format!("Failed to move {}: {}", src_key, e))
            }
        })?;
        Ok(())
    }

    async fn list(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        token: Option<&str>,
        max_keys: usize,
    ) -> Result<ObjectPage> {
        let all = self.collect_keys(bucket, prefix).await?;
        let offset = match token {
            Some(t) => decode_token(t)?,
            None => 0,
        };
        let max_keys = max_keys.clamp(1, 1000);

        let end = (offset + max_keys).min(all.len());
        let objects: Vec<ObjectInfo> = all
            .get(offset..end)
            .map(|s| s.to_vec())
            .unwrap_or_default();
        let is_truncated = end < all.len();
        let next_token = is_truncated.then(|| encode_token(end));

        Ok(ObjectPage {
            objects,
            next_token,
            is_truncated,
        })
    }

    async fn presign(
        &self,
        bucket: &str,
        key: &str,
        method: HttpMethod,
        expires_in: Duration,
    ) -> Result<String> {
        // No credential to embed; produce a file URL carrying the verb and
        // absolute expiry so dev tooling can honor the same contract.
        let path = self.object_path(bucket, key)?;
        let expires = Utc::now() + chrono::Duration::seconds(expires_in.as_secs() as i64);
        Ok(format!(
            "file://{}?method={}&expires={}",
            path.display(),
            method,
            expires.timestamp()
        ))
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        ensure_bucket_safe(bucket)?;
        fs::create_dir_all(self.bucket_root(bucket)).await?;
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        ensure_bucket_safe(bucket)?;
        let root = self.bucket_root(bucket);
        match fs::remove_dir_all(&root).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to delete bucket {}: {}",
                bucket, e
            ))),
        }
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        ensure_bucket_safe(bucket)?;
        Ok(self.bucket_root(bucket).is_dir())
    }

    async fn list_buckets(&self) -> Result<Vec<String>> {
        let mut buckets = Vec::new();
        let mut entries = fs::read_dir(&self.base_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.path().is_dir() {
                buckets.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        buckets.sort();
        Ok(buckets)
    }

    async fn usage(&self, bucket: &str) -> Result<StorageUsage> {
        let all = self.collect_keys(bucket, None).await?;
        Ok(StorageUsage {
            object_count: all.len() as u64,
            total_bytes: all.iter().map(|o| o.size_bytes).sum(),
        })
    }

    async fn health_check(&self) -> Result<()> {
        fs::metadata(&self.base_path).await.map_err(|e| {
            AppError::Storage(format!(
                "Storage root {} not accessible: {}",
                self.base_path.display(),
                e
            ))
        })?;
        Ok(())
    }
}

impl FilesystemProvider {
    /// Root directory, exposed for diagnostics
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn provider() -> (FilesystemProvider, TempDir) {
        let tmp = TempDir::new().unwrap();
        let provider = FilesystemProvider::new(tmp.path()).await.unwrap();
        provider.create_bucket("docs").await.unwrap();
        (provider, tmp)
    }

    #[tokio::test]
    async fn put_get_round_trip() {
        let (fs, _tmp) = provider().await;
        let content = Bytes::from("hello world");
        fs.upload("docs", "a/b.txt", content.clone(), &ObjectMetadata::default())
            .await
            .unwrap();
        assert_eq!(fs.download("docs", "a/b.txt").await.unwrap(), content);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (fs, _tmp) = provider().await;
        fs.delete("docs", "missing.txt").await.unwrap();
        fs.upload("docs", "x.txt", Bytes::from("x"), &ObjectMetadata::default())
            .await
            .unwrap();
        fs.delete("docs", "x.txt").await.unwrap();
        fs.delete("docs", "x.txt").await.unwrap();
        assert!(!fs.exists("docs", "x.txt").await.unwrap());
    }

    #[tokio::test]
    async fn download_missing_is_not_found() {
        let (fs, _tmp) = provider().await;
        let err = fs.download("docs", "nope.txt").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn rename_moves_object() {
        let (fs, _tmp) = provider().await;
        fs.upload("docs", "src.txt", Bytes::from("data"), &ObjectMetadata::default())
            .await
            .unwrap();
        fs.rename("docs", "src.txt", "docs", "deep/dst.txt")
            .await
            .unwrap();
        assert!(!fs.exists("docs", "src.txt").await.unwrap());
        assert_eq!(
            fs.download("docs", "deep/dst.txt").await.unwrap(),
            Bytes::from("data")
        );
    }

    #[tokio::test]
    async fn list_pages_with_offset_tokens() {
        let (fs, _tmp) = provider().await;
        for i in 0..5 {
            fs.upload(
                "docs",
                &format!("file-{}.txt", i),
                Bytes::from("x"),
                &ObjectMetadata::default(),
            )
            .await
            .unwrap();
        }

        let page1 = fs.list("docs", None, None, 2).await.unwrap();
        assert_eq!(page1.objects.len(), 2);
        assert!(page1.is_truncated);

        let page2 = fs
            .list("docs", None, page1.next_token.as_deref(), 2)
            .await
            .unwrap();
        assert_eq!(page2.objects.len(), 2);
        assert_ne!(page1.objects[0].key, page2.objects[0].key);

        let page3 = fs
            .list("docs", None, page2.next_token.as_deref(), 2)
            .await
            .unwrap();
        assert_eq!(page3.objects.len(), 1);
        assert!(!page3.is_truncated);
        assert!(page3.next_token.is_none());
    }

    #[tokio::test]
    async fn list_respects_prefix() {
        let (fs, _tmp) = provider().await;
        fs.upload("docs", "2024/a.txt", Bytes::from("x"), &ObjectMetadata::default())
            .await
            .unwrap();
        fs.upload("docs", "2025/b.txt", Bytes::from("y"), &ObjectMetadata::default())
            .await
            .unwrap();

        let page = fs.list("docs", Some("2024/"), None, 10).await.unwrap();
        assert_eq!(page.objects.len(), 1);
        assert_eq!(page.objects[0].key, "2024/a.txt");
    }

    #[tokio::test]
    async fn batch_delete_reports_partial_success() {
        let (fs, _tmp) = provider().await;
        fs.upload("docs", "keep/a.txt", Bytes::from("a"), &ObjectMetadata::default())
            .await
            .unwrap();

        let keys = vec![
            "keep/a.txt".to_string(),
            "missing.txt".to_string(),
            "../escape".to_string(),
        ];
        let outcome = fs.delete_batch("docs", &keys).await.unwrap();
        // Missing objects delete cleanly; invalid keys are reported per-key
        assert_eq!(outcome.deleted.len() + outcome.failed.len(), keys.len());
        assert!(outcome.deleted.contains(&"keep/a.txt".to_string()));
        assert!(outcome.deleted.contains(&"missing.txt".to_string()));
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].key, "../escape");
    }

    #[tokio::test]
    async fn traversal_keys_rejected() {
        let (fs, _tmp) = provider().await;
        let err = fs
            .upload("docs", "../oops", Bytes::from("x"), &ObjectMetadata::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn usage_counts_objects_and_bytes() {
        let (fs, _tmp) = provider().await;
        fs.upload("docs", "a.bin", Bytes::from(vec![0u8; 10]), &ObjectMetadata::default())
            .await
            .unwrap();
        fs.upload("docs", "b.bin", Bytes::from(vec![0u8; 5]), &ObjectMetadata::default())
            .await
            .unwrap();
        let usage = fs.usage("docs").await.unwrap();
        assert_eq!(usage.object_count, 2);
        assert_eq!(usage.total_bytes, 15);
    }

    #[tokio::test]
    async fn bucket_lifecycle() {
        let (fs, _tmp) = provider().await;
        assert!(fs.bucket_exists("docs").await.unwrap());
        fs.create_bucket("other").await.unwrap();
        let buckets = fs.list_buckets().await.unwrap();
        assert_eq!(buckets, vec!["docs".to_string(), "other".to_string()]);
        fs.delete_bucket("other").await.unwrap();
        assert!(!fs.bucket_exists("other").await.unwrap());
    }

    #[tokio::test]
    async fn presign_embeds_method_and_expiry() {
        let (fs, _tmp) = provider().await;
        let url = fs
            .presign("docs", "a.txt", HttpMethod::Get, Duration::from_secs(60))
            .await
            .unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.contains("method=GET"));
        assert!(url.contains("expires="));
    }
}
