//! Storage orchestrator: coordinates backend writes, metadata rows, the
//! presign cache, and lifecycle events.
//!
//! Writes are two-phase (object first, row second) with a compensating
//! delete when the second phase fails, so the metadata store never points
//! at bytes that were not written. The reverse orphan (bytes without a
//! row) is tolerated and logged; a sweep can reconcile it later.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::cache::{CachedUrl, UrlCache};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{Document, DocumentStats, DocumentUpdate};
use crate::storage::{
    BatchDeleteOutcome, CloudStorageProvider, FailedDelete, HttpMethod, ObjectMetadata,
};

use super::document_service::{DocumentFilter, DocumentService, NewDocument};
use super::event_bus::{DocumentEvent, EventBus};

/// Validation limits applied before any I/O happens
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_size_bytes: u64,
    /// Exact MIME types or wildcard prefixes like "image/*"; "*/*" allows all
    pub allowed_mime_types: Vec<String>,
    pub presign_default_expiry: Duration,
    pub public_url_expiry: Duration,
}

impl UploadPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_size_bytes: config.max_upload_size_bytes,
            allowed_mime_types: config.allowed_mime_types.clone(),
            presign_default_expiry: Duration::from_secs(config.presign_default_expiry_secs),
            public_url_expiry: Duration::from_secs(config.public_url_expiry_secs),
        }
    }

    fn mime_allowed(&self, mime: &str) -> bool {
        self.allowed_mime_types.iter().any(|allowed| {
            if allowed == "*/*" {
                true
            } else if let Some(prefix) = allowed.strip_suffix("/*") {
                mime.split('/').next() == Some(prefix)
            } else {
                allowed.eq_ignore_ascii_case(mime)
            }
        })
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_size_bytes: 100 * 1024 * 1024,
            allowed_mime_types: vec!["*/*".into()],
            presign_default_expiry: Duration::from_secs(3600),
            public_url_expiry: Duration::from_secs(604_800),
        }
    }
}

/// One upload, fully described by the caller
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub bucket: String,
    pub filename: String,
    pub mime_type: String,
    pub content: Bytes,
    /// Caller-chosen storage path; server-generated when unset
    pub path: Option<String>,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub media_type: Option<String>,
    pub position: Option<i64>,
    pub is_public: bool,
    pub tenant_id: Option<String>,
    pub user_id: Option<String>,
    pub product_id: Option<String>,
    pub tags: HashMap<String, String>,
}

impl UploadRequest {
    pub fn new(
        bucket: impl Into<String>,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        content: Bytes,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            filename: filename.into(),
            mime_type: mime_type.into(),
            content,
            path: None,
            entity_type: None,
            entity_id: None,
            media_type: None,
            position: None,
            is_public: false,
            tenant_id: None,
            user_id: None,
            product_id: None,
            tags: HashMap::new(),
        }
    }
}

/// One page of a document listing
#[derive(Debug, Clone)]
pub struct DocumentPage {
    pub documents: Vec<Document>,
    /// Opaque continuation token for the next page
    pub next_token: Option<String>,
    pub has_more: bool,
    /// Total matching documents across all pages
    pub total_count: i64,
}

/// A minted presigned URL with the verb it is bound to and its absolute
/// expiry
#[derive(Debug, Clone)]
pub struct PresignedUrl {
    pub url: String,
    pub method: HttpMethod,
    pub expires_at: DateTime<Utc>,
}

pub struct StorageOrchestrator {
    provider: Arc<dyn CloudStorageProvider>,
    documents: DocumentService,
    cache: Arc<dyn UrlCache>,
    events: Arc<EventBus>,
    policy: UploadPolicy,
}

impl StorageOrchestrator {
    pub fn new(
        provider: Arc<dyn CloudStorageProvider>,
        documents: DocumentService,
        cache: Arc<dyn UrlCache>,
        events: Arc<EventBus>,
        policy: UploadPolicy,
    ) -> Self {
        Self {
            provider,
            documents,
            cache,
            events,
            policy,
        }
    }

    /// Store a document: backend write first, metadata row second.
    ///
    /// On metadata failure the freshly written object is deleted again so no
    /// unreachable bytes accumulate. Cancellation after the backend write
    /// runs the same compensation before surfacing `AppError::Cancelled`.
    pub async fn upload(
        &self,
        request: UploadRequest,
        cancel: &CancellationToken,
    ) -> Result<Document> {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled("upload".into()));
        }

        let filename = sanitize_filename(&request.filename)?;
        self.validate_upload(&request)?;

        let checksum = calculate_sha256(&request.content);
        let explicit_path = request.path.is_some();
        let (path, storage_filename) = match request.path.as_deref() {
            Some(p) => {
                validate_explicit_path(p)?;
                // Uniqueness is checked before any backend I/O: a
                // conflicting upload must never overwrite the object the
                // existing row points at
                match self.documents.get_by_path(&request.bucket, p, None).await {
                    Ok(_) => {
                        return Err(AppError::Conflict(format!(
                            "Document already exists at {}/{}",
                            request.bucket, p
                        )))
                    }
                    Err(e) if e.is_not_found() => {}
                    Err(e) => return Err(e),
                }
                let name = p.rsplit('/').next().unwrap_or(p).to_string();
                (p.to_string(), name)
            }
            None => generate_path(&filename),
        };

        let mut metadata = ObjectMetadata::with_content_type(&request.mime_type);
        metadata
            .attributes
            .insert("original-filename".into(), filename.clone());
        metadata
            .attributes
            .insert("checksum-sha256".into(), checksum.clone());
        if let Some(ref tenant) = request.tenant_id {
            metadata.attributes.insert("tenant-id".into(), tenant.clone());
        }

        self.provider
            .upload(&request.bucket, &path, request.content.clone(), &metadata)
            .await?;

        if cancel.is_cancelled() {
            self.compensate_delete(&request.bucket, &path, "upload cancelled")
                .await;
            return Err(AppError::Cancelled("upload".into()));
        }

        let new = NewDocument {
            bucket: request.bucket.clone(),
            path: path.clone(),
            original_filename: filename,
            storage_filename,
            mime_type: request.mime_type.clone(),
            size_bytes: request.content.len() as i64,
            checksum_sha256: checksum,
            entity_type: request.entity_type,
            entity_id: request.entity_id,
            media_type: request.media_type,
            position: request.position,
            is_public: request.is_public,
            tenant_id: request.tenant_id.clone(),
            user_id: request.user_id.clone(),
            product_id: request.product_id.clone(),
            provider: self.provider.name().to_string(),
            tags: request.tags,
        };

        let mut document = match self.documents.create(new).await {
            Ok(doc) => doc,
            Err(e) => {
                // An explicit-path upload that lost the race to a concurrent
                // writer must leave the object alone: it now belongs to the
                // winning row. Server-generated paths are fresh uuids, so
                // their insert failures always compensate.
                if explicit_path && matches!(e, AppError::Conflict(_)) {
                    tracing::warn!(
                        bucket = %request.bucket,
                        path = %path,
                        "Concurrent upload won the path; leaving object in place"
                    );
                } else {
                    self.compensate_delete(&request.bucket, &path, "metadata insert failed")
                        .await;
                }
                return Err(e);
            }
        };

        // Best effort: a missing public URL never fails the upload
        if document.is_public {
            match self
                .provider
                .presign(
                    &document.bucket,
                    &document.path,
                    HttpMethod::Get,
                    self.policy.public_url_expiry,
                )
                .await
            {
                Ok(url) => {
                    document = self
                        .documents
                        .update(
                            document.id,
                            request.tenant_id.as_deref(),
                            DocumentUpdate {
                                public_url: Some(url),
                                ..Default::default()
                            },
                        )
                        .await?;
                }
                Err(e) => {
                    tracing::warn!(
                        bucket = %document.bucket,
                        path = %document.path,
                        error = %e,
                        "Failed to generate public URL"
                    );
                }
            }
        }

        self.events.publish(
            DocumentEvent::now(
                "document.uploaded",
                document.id,
                &document.bucket,
                &document.path,
            )
            .with_tenant(document.tenant_id.clone())
            .with_product(document.product_id.clone())
            .with_actor(request.user_id),
        );

        tracing::info!(
            id = %document.id,
            bucket = %document.bucket,
            path = %document.path,
            size = document.size_bytes,
            "Document stored"
        );
        Ok(document)
    }

    /// Fetch a document's metadata and payload.
    pub async fn download(
        &self,
        bucket: &str,
        path: &str,
        tenant: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<(Document, Bytes)> {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled("download".into()));
        }

        // Metadata first: tenant scoping happens here, the backend has no
        // notion of tenants
        let document = self.documents.get_by_path(bucket, path, tenant).await?;
        let content = self.provider.download(bucket, &document.path).await?;
        Ok((document, content))
    }

    /// Delete a document: backend object first, then the metadata row.
    ///
    /// Backend delete is idempotent, so a crash between the two steps leaves
    /// a row pointing at nothing; a retry of the same delete converges.
    pub async fn delete(
        &self,
        bucket: &str,
        path: &str,
        tenant: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled("delete".into()));
        }

        let document = self.documents.get_by_path(bucket, path, tenant).await?;

        self.provider.delete(bucket, &document.path).await?;
        self.documents.soft_delete(document.id, tenant).await?;
        self.cache_invalidate(bucket, &document.path).await;

        self.events.publish(
            DocumentEvent::now("document.deleted", document.id, bucket, &document.path)
                .with_tenant(document.tenant_id.clone())
                .with_product(document.product_id.clone()),
        );

        tracing::info!(id = %document.id, bucket = %bucket, path = %path, "Document deleted");
        Ok(())
    }

    /// Copy a document to a new path, registering a new metadata row.
    pub async fn copy(
        &self,
        src_bucket: &str,
        src_path: &str,
        dst_bucket: &str,
        dst_path: &str,
        tenant: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Document> {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled("copy".into()));
        }

        let source = self.documents.get_by_path(src_bucket, src_path, tenant).await?;

        self.provider
            .copy(src_bucket, src_path, dst_bucket, dst_path)
            .await?;

        let new = NewDocument {
            bucket: dst_bucket.to_string(),
            path: dst_path.to_string(),
            original_filename: source.original_filename.clone(),
            storage_filename: source.storage_filename.clone(),
            mime_type: source.mime_type.clone(),
            size_bytes: source.size_bytes,
            checksum_sha256: source.checksum_sha256.clone(),
            entity_type: source.entity_type.clone(),
            entity_id: source.entity_id.clone(),
            media_type: source.media_type.clone(),
            position: source.position,
            is_public: false,
            tenant_id: source.tenant_id.clone(),
            user_id: source.user_id.clone(),
            product_id: source.product_id.clone(),
            provider: self.provider.name().to_string(),
            tags: source.tags.0.clone(),
        };

        let document = match self.documents.create(new).await {
            Ok(doc) => doc,
            Err(e) => {
                self.compensate_delete(dst_bucket, dst_path, "copy metadata insert failed")
                    .await;
                return Err(e);
            }
        };

        self.events.publish(
            DocumentEvent::now("document.copied", document.id, dst_bucket, dst_path)
                .with_tenant(document.tenant_id.clone())
                .with_product(document.product_id.clone()),
        );

        Ok(document)
    }

    /// Move a document to a new path, keeping its id.
    ///
    /// A move mutates the existing row's location in place. The backend
    /// rename and the row update are not atomic; a crash between them
    /// leaves the row pointing at the old key until the move is retried.
    pub async fn move_document(
        &self,
        src_bucket: &str,
        src_path: &str,
        dst_bucket: &str,
        dst_path: &str,
        tenant: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Document> {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled("move".into()));
        }

        let source = self.documents.get_by_path(src_bucket, src_path, tenant).await?;

        // Check the destination before touching the backend so a doomed
        // move never displaces the object
        match self.documents.get_by_path(dst_bucket, dst_path, None).await {
            Ok(_) => {
                return Err(AppError::Conflict(format!(
                    "Document already exists at {}/{}",
                    dst_bucket, dst_path
                )))
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        self.provider
            .rename(src_bucket, src_path, dst_bucket, dst_path)
            .await?;
        self.cache_invalidate(src_bucket, src_path).await;

        let document = match self
            .documents
            .update_location(source.id, tenant, dst_bucket, dst_path)
            .await
        {
            Ok(doc) => doc,
            Err(e) => {
                // Put the object back so the row keeps pointing at real bytes
                if let Err(undo) = self
                    .provider
                    .rename(dst_bucket, dst_path, src_bucket, src_path)
                    .await
                {
                    tracing::warn!(
                        bucket = %src_bucket,
                        path = %src_path,
                        error = %undo,
                        "Failed to restore object after move rollback"
                    );
                }
                return Err(e);
            }
        };

        self.events.publish(
            DocumentEvent::now("document.moved", document.id, dst_bucket, dst_path)
                .with_tenant(document.tenant_id.clone())
                .with_product(document.product_id.clone()),
        );

        Ok(document)
    }

    /// Generate a presigned URL for one document.
    ///
    /// GET URLs are cached under the document's location; the cache evicts
    /// entries well before the URL expires, so a hit always has usable life
    /// left. A hit is served regardless of the requested expiry, and the
    /// returned `expires_at` is the URL's real one. PUT and DELETE URLs are
    /// never cached.
    pub async fn presigned_url(
        &self,
        bucket: &str,
        path: &str,
        method: HttpMethod,
        expires_in: Option<Duration>,
        tenant: Option<&str>,
    ) -> Result<PresignedUrl> {
        // Existence and tenant check before handing out any credential
        let document = self.documents.get_by_path(bucket, path, tenant).await?;
        let expiry = expires_in.unwrap_or(self.policy.presign_default_expiry);
        if expiry.is_zero() {
            return Err(AppError::Validation("Presign expiry must be positive".into()));
        }
        let expires_at = Utc::now() + chrono::Duration::seconds(expiry.as_secs() as i64);

        if method != HttpMethod::Get {
            let url = self
                .provider
                .presign(bucket, &document.path, method, expiry)
                .await?;
            return Ok(PresignedUrl {
                url,
                method,
                expires_at,
            });
        }

        let cache_key = self.presign_cache_key(bucket, &document.path);
        if let Some(hit) = self.cache.get(&cache_key).await {
            tracing::debug!(bucket = %bucket, path = %path, "Presign cache hit");
            return Ok(PresignedUrl {
                url: hit.url,
                method,
                expires_at: hit.expires_at,
            });
        }

        let url = self
            .provider
            .presign(bucket, &document.path, HttpMethod::Get, expiry)
            .await?;

        self.cache
            .put(
                cache_key,
                CachedUrl {
                    url: url.clone(),
                    expires_at,
                },
            )
            .await;

        Ok(PresignedUrl {
            url,
            method,
            expires_at,
        })
    }

    /// Delete several documents at once; per-path failures never abort the
    /// batch. Metadata rows are removed only for objects the backend
    /// actually deleted.
    pub async fn batch_delete(
        &self,
        bucket: &str,
        paths: &[String],
        tenant: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<BatchDeleteOutcome> {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled("batch delete".into()));
        }
        if paths.is_empty() {
            return Ok(BatchDeleteOutcome::default());
        }

        // Resolve every path through the metadata store before the backend
        // sees any of them: only objects visible to the caller are deleted,
        // so no request can reach another tenant's bytes
        let mut outcome = BatchDeleteOutcome::default();
        let mut owned: Vec<Document> = Vec::new();
        for path in paths {
            match self.documents.get_by_path(bucket, path, tenant).await {
                Ok(doc) => owned.push(doc),
                Err(e) if e.is_not_found() => outcome.failed.push(FailedDelete {
                    key: path.clone(),
                    error: e.to_string(),
                }),
                Err(e) => return Err(e),
            }
        }
        if owned.is_empty() {
            return Ok(outcome);
        }

        let keys: Vec<String> = owned.iter().map(|d| d.path.clone()).collect();
        let backend = self.provider.delete_batch(bucket, &keys).await?;

        if !backend.deleted.is_empty() {
            self.documents
                .batch_soft_delete(bucket, &backend.deleted, tenant)
                .await?;
        }
        for doc in &owned {
            if backend.deleted.contains(&doc.path) {
                self.cache_invalidate(bucket, &doc.path).await;
                self.events.publish(
                    DocumentEvent::now("document.deleted", doc.id, bucket, &doc.path)
                        .with_tenant(doc.tenant_id.clone())
                        .with_product(doc.product_id.clone()),
                );
            }
        }
        for failure in &backend.failed {
            tracing::warn!(
                bucket = %bucket,
                key = %failure.key,
                error = %failure.error,
                "Batch delete item failed"
            );
        }

        outcome.deleted = backend.deleted;
        outcome.failed.extend(backend.failed);
        Ok(outcome)
    }

    /// List documents in a bucket, served from the metadata store.
    ///
    /// `has_more` is heuristic: a final page whose size equals the limit
    /// reports one extra empty page.
    pub async fn list(
        &self,
        bucket: &str,
        tenant: Option<&str>,
        limit: i64,
        token: Option<&str>,
    ) -> Result<DocumentPage> {
        let limit = limit.clamp(1, 1000);
        let offset = match token {
            Some(t) => decode_token(t)?,
            None => 0,
        };

        let filter = DocumentFilter {
            bucket: Some(bucket.to_string()),
            tenant_id: tenant.map(String::from),
            limit,
            offset,
            ..Default::default()
        };
        let total_count = self.documents.count(&filter).await?;
        let documents = self.documents.list(&filter).await?;

        let has_more = documents.len() as i64 == limit;
        let next_token = has_more.then(|| encode_token(offset + documents.len() as i64));

        Ok(DocumentPage {
            documents,
            next_token,
            has_more,
            total_count,
        })
    }

    pub async fn stats(&self, bucket: &str, tenant: Option<&str>) -> Result<DocumentStats> {
        self.documents.stats_by_bucket(bucket, tenant).await
    }

    pub async fn health(&self) -> Result<()> {
        self.provider.health_check().await
    }

    fn validate_upload(&self, request: &UploadRequest) -> Result<()> {
        if request.content.is_empty() {
            return Err(AppError::Validation("Upload is empty".into()));
        }
        if request.content.len() as u64 > self.policy.max_size_bytes {
            return Err(AppError::Validation(format!(
                "Upload of {} bytes exceeds the {} byte limit",
                request.content.len(),
                self.policy.max_size_bytes
            )));
        }
        if !self.policy.mime_allowed(&request.mime_type) {
            return Err(AppError::Validation(format!(
                "MIME type not allowed: {}",
                request.mime_type
            )));
        }
        Ok(())
    }

    // One entry per document location; the URL expiry lives in the value,
    // so invalidating this key clears everything cached for the path
    fn presign_cache_key(&self, bucket: &str, path: &str) -> String {
        format!("presign:{}:{}:{}", self.provider.name(), bucket, path)
    }

    async fn cache_invalidate(&self, bucket: &str, path: &str) {
        let key = self.presign_cache_key(bucket, path);
        self.cache.invalidate(&key).await;
    }

    /// Best-effort removal of an object whose metadata write did not land.
    /// Failure leaves an orphan object, which is logged and harmless.
    async fn compensate_delete(&self, bucket: &str, path: &str, reason: &str) {
        if let Err(e) = self.provider.delete(bucket, path).await {
            tracing::warn!(
                bucket = %bucket,
                path = %path,
                reason = %reason,
                error = %e,
                "Compensating delete failed; object orphaned"
            );
        } else {
            tracing::debug!(bucket = %bucket, path = %path, reason = %reason, "Compensating delete done");
        }
    }
}

/// SHA-256 hex digest of a payload
pub fn calculate_sha256(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Strip any directory components and reject names that vanish entirely.
fn sanitize_filename(filename: &str) -> Result<String> {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        return Err(AppError::Validation(format!(
            "Invalid filename: {:?}",
            filename
        )));
    }
    Ok(name.to_string())
}

/// Validate a caller-chosen storage path: relative, no empty or dot
/// segments, no control characters.
fn validate_explicit_path(path: &str) -> Result<()> {
    if path.is_empty()
        || path.ends_with('/')
        || path
            .split('/')
            .any(|seg| seg.is_empty() || seg == "." || seg == "..")
        || path.bytes().any(|b| b.is_ascii_control())
    {
        return Err(AppError::Validation(format!(
            "Invalid storage path: {:?}",
            path
        )));
    }
    Ok(())
}

/// Server-generated storage path: date prefix plus a fresh uuid, keeping the
/// original extension. Returns (path, storage_filename).
fn generate_path(filename: &str) -> (String, String) {
    let ext: String = filename
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .filter(|e| !e.is_empty() && e.len() <= 10 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e))
        .unwrap_or_default();

    let storage_filename = format!("{}{}", Uuid::new_v4(), ext);
    let date = chrono::Utc::now().format("%Y/%m/%d");
    (format!("{}/{}", date, storage_filename), storage_filename)
}

fn encode_token(offset: i64) -> String {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    BASE64.encode(offset.to_string())
}

fn decode_token(token: &str) -> Result<i64> {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    let bytes = BASE64
        .decode(token)
        .map_err(|_| AppError::Validation(format!("Invalid continuation token: {}", token)))?;
    String::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|n| *n >= 0)
        .ok_or_else(|| AppError::Validation(format!("Invalid continuation token: {}", token)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("report.pdf").unwrap(), "report.pdf");
        assert_eq!(sanitize_filename("/etc/passwd").unwrap(), "passwd");
        assert_eq!(sanitize_filename("a\\b\\c.txt").unwrap(), "c.txt");
        assert!(sanitize_filename("").is_err());
        assert!(sanitize_filename("..").is_err());
        assert!(sanitize_filename("dir/").is_err());
    }

    #[test]
    fn test_validate_explicit_path() {
        assert!(validate_explicit_path("reports/2026/q3.pdf").is_ok());
        assert!(validate_explicit_path("flat.pdf").is_ok());
        assert!(validate_explicit_path("").is_err());
        assert!(validate_explicit_path("/rooted.pdf").is_err());
        assert!(validate_explicit_path("dir/").is_err());
        assert!(validate_explicit_path("a//b.pdf").is_err());
        assert!(validate_explicit_path("a/../b.pdf").is_err());
        assert!(validate_explicit_path("a/./b.pdf").is_err());
        assert!(validate_explicit_path("bad\nname.pdf").is_err());
    }

    #[test]
    fn test_generate_path_shape() {
        let (path, storage_filename) = generate_path("Invoice.PDF");
        assert!(path.ends_with(&storage_filename));
        assert!(storage_filename.ends_with(".pdf"));
        // YYYY/MM/DD prefix plus the filename
        assert_eq!(path.split('/').count(), 4);

        let (_, no_ext) = generate_path("Makefile");
        assert!(!no_ext.contains('.'));

        // Oversized or non-alphanumeric extensions are dropped
        let (_, weird) = generate_path("archive.tar.gz-backup-copy");
        assert!(!weird.contains('.'));
    }

    #[test]
    fn test_mime_policy() {
        let policy = UploadPolicy {
            allowed_mime_types: vec!["image/*".into(), "application/pdf".into()],
            ..Default::default()
        };
        assert!(policy.mime_allowed("image/png"));
        assert!(policy.mime_allowed("image/jpeg"));
        assert!(policy.mime_allowed("application/pdf"));
        assert!(policy.mime_allowed("Application/PDF"));
        assert!(!policy.mime_allowed("video/mp4"));
        assert!(!policy.mime_allowed("application/zip"));

        let open = UploadPolicy::default();
        assert!(open.mime_allowed("anything/at-all"));
    }

    #[test]
    fn test_checksum() {
        assert_eq!(
            calculate_sha256(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_token_round_trip() {
        let token = encode_token(42);
        assert_eq!(decode_token(&token).unwrap(), 42);
        assert!(decode_token("not-base64!!").is_err());
        assert!(decode_token(&encode_token(-1)).is_err());
    }
}
