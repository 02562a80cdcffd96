//! Relational metadata store for documents.
//!
//! Every byte payload lives in an object-storage backend; this service owns
//! the row that describes it. All reads exclude soft-deleted rows, and every
//! query is tenant-scoped whenever a tenant id is supplied.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{map_db_error, AppError, Result};
use crate::models::{Document, DocumentStats, DocumentUpdate};

/// Fields required to register a freshly stored document
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub bucket: String,
    pub path: String,
    pub original_filename: String,
    pub storage_filename: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub checksum_sha256: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub media_type: Option<String>,
    pub position: Option<i64>,
    pub is_public: bool,
    pub tenant_id: Option<String>,
    pub user_id: Option<String>,
    pub product_id: Option<String>,
    pub provider: String,
    pub tags: HashMap<String, String>,
}

/// Filter for document listings; unset fields do not constrain the query
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    pub bucket: Option<String>,
    pub provider: Option<String>,
    /// Exact MIME type match, e.g. "application/pdf"
    pub mime_type: Option<String>,
    /// MIME prefix match, e.g. "image/" matches image/png and image/jpeg
    pub mime_prefix: Option<String>,
    pub tenant_id: Option<String>,
    pub user_id: Option<String>,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub is_public: Option<bool>,
    pub min_size_bytes: Option<i64>,
    pub max_size_bytes: Option<i64>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    /// Exact tag value match
    pub tag_equals: Option<(String, String)>,
    /// Tag key presence, any value
    pub tag_exists: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl DocumentFilter {
    pub fn in_bucket(bucket: impl Into<String>) -> Self {
        Self {
            bucket: Some(bucket.into()),
            limit: 100,
            ..Default::default()
        }
    }
}

/// sqlx repository over the `documents` table
#[derive(Clone)]
pub struct DocumentService {
    pool: SqlitePool,
}

impl DocumentService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new document row.
    ///
    /// A live row with the same `(bucket, path)` surfaces as
    /// `AppError::Conflict`; paths freed by soft deletion are reusable.
    pub async fn create(&self, new: NewDocument) -> Result<Document> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO documents (
                id, bucket, path, original_filename, storage_filename,
                mime_type, size_bytes, checksum_sha256,
                entity_type, entity_id, media_type, position,
                is_public, public_url, tenant_id, user_id, product_id,
                provider, tags, is_deleted, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, ?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(id)
        .bind(&new.bucket)
        .bind(&new.path)
        .bind(&new.original_filename)
        .bind(&new.storage_filename)
        .bind(&new.mime_type)
        .bind(new.size_bytes)
        .bind(&new.checksum_sha256)
        .bind(&new.entity_type)
        .bind(&new.entity_id)
        .bind(&new.media_type)
        .bind(new.position)
        .bind(new.is_public)
        .bind(&new.tenant_id)
        .bind(&new.user_id)
        .bind(&new.product_id)
        .bind(&new.provider)
        .bind(Json(&new.tags))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_db_error(
                e,
                &format!("Document already exists at {}/{}", new.bucket, new.path),
            )
        })?;

        self.get_by_id(id, new.tenant_id.as_deref()).await
    }

    pub async fn get_by_id(&self, id: Uuid, tenant: Option<&str>) -> Result<Document> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT * FROM documents WHERE is_deleted = 0 AND id = ",
        );
        qb.push_bind(id);
        if let Some(t) = tenant {
            qb.push(" AND tenant_id = ").push_bind(t);
        }

        qb.build_query_as::<Document>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document not found: {}", id)))
    }

    pub async fn get_by_path(
        &self,
        bucket: &str,
        path: &str,
        tenant: Option<&str>,
    ) -> Result<Document> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT * FROM documents WHERE is_deleted = 0 AND bucket = ",
        );
        qb.push_bind(bucket);
        qb.push(" AND path = ").push_bind(path);
        if let Some(t) = tenant {
            qb.push(" AND tenant_id = ").push_bind(t);
        }

        qb.build_query_as::<Document>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document not found: {}/{}", bucket, path)))
    }

    /// Partial metadata update; unset fields keep their current value.
    pub async fn update(
        &self,
        id: Uuid,
        tenant: Option<&str>,
        update: DocumentUpdate,
    ) -> Result<Document> {
        // Fetch first so tenant scoping and existence are checked once
        let current = self.get_by_id(id, tenant).await?;

        let entity_type = update.entity_type.or(current.entity_type);
        let entity_id = update.entity_id.or(current.entity_id);
        let media_type = update.media_type.or(current.media_type);
        let position = update.position.or(current.position);
        let is_public = update.is_public.unwrap_or(current.is_public);
        let public_url = update.public_url.or(current.public_url);
        let tags = update.tags.unwrap_or(current.tags.0);

        sqlx::query(
            r#"
            UPDATE documents
            SET entity_type = ?, entity_id = ?, media_type = ?, position = ?,
                is_public = ?, public_url = ?, tags = ?, updated_at = ?
            WHERE id = ? AND is_deleted = 0
            "#,
        )
        .bind(&entity_type)
        .bind(&entity_id)
        .bind(&media_type)
        .bind(position)
        .bind(is_public)
        .bind(&public_url)
        .bind(Json(&tags))
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get_by_id(id, tenant).await
    }

    /// Mark a document deleted; the row is kept for audit.
    pub async fn soft_delete(&self, id: Uuid, tenant: Option<&str>) -> Result<Document> {
        let doc = self.get_by_id(id, tenant).await?;

        sqlx::query("UPDATE documents SET is_deleted = 1, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(doc)
    }

    pub async fn soft_delete_by_path(
        &self,
        bucket: &str,
        path: &str,
        tenant: Option<&str>,
    ) -> Result<Document> {
        let doc = self.get_by_path(bucket, path, tenant).await?;
        self.soft_delete(doc.id, tenant).await
    }

    /// List documents matching a filter, newest first.
    pub async fn list(&self, filter: &DocumentFilter) -> Result<Vec<Document>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM documents WHERE is_deleted = 0");
        apply_filter(&mut qb, filter);

        qb.push(" ORDER BY created_at DESC, id DESC");
        let limit = if filter.limit > 0 { filter.limit } else { 100 };
        qb.push(" LIMIT ").push_bind(limit);
        if filter.offset > 0 {
            qb.push(" OFFSET ").push_bind(filter.offset);
        }

        let docs = qb.build_query_as::<Document>().fetch_all(&self.pool).await?;
        Ok(docs)
    }

    /// Count documents matching a filter, ignoring its limit and offset.
    pub async fn count(&self, filter: &DocumentFilter) -> Result<i64> {
        let mut qb =
            QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM documents WHERE is_deleted = 0");
        apply_filter(&mut qb, filter);

        let count = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Move a document to a new bucket/path, keeping its id.
    ///
    /// A live row already at the target surfaces as `AppError::Conflict`
    /// through the same partial unique index that guards inserts.
    pub async fn update_location(
        &self,
        id: Uuid,
        tenant: Option<&str>,
        bucket: &str,
        path: &str,
    ) -> Result<Document> {
        // Tenant scoping and existence are checked by the fetch
        self.get_by_id(id, tenant).await?;

        sqlx::query(
            "UPDATE documents SET bucket = ?, path = ?, updated_at = ? \
             WHERE id = ? AND is_deleted = 0",
        )
        .bind(bucket)
        .bind(path)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_db_error(
                e,
                &format!("Document already exists at {}/{}", bucket, path),
            )
        })?;

        self.get_by_id(id, tenant).await
    }

    /// Soft-delete several documents by path; returns the rows affected.
    pub async fn batch_soft_delete(
        &self,
        bucket: &str,
        paths: &[String],
        tenant: Option<&str>,
    ) -> Result<u64> {
        if paths.is_empty() {
            return Ok(0);
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            "UPDATE documents SET is_deleted = 1, updated_at = ",
        );
        qb.push_bind(Utc::now());
        qb.push(" WHERE is_deleted = 0 AND bucket = ").push_bind(bucket);
        if let Some(t) = tenant {
            qb.push(" AND tenant_id = ").push_bind(t);
        }
        qb.push(" AND path IN (");
        let mut separated = qb.separated(", ");
        for path in paths {
            separated.push_bind(path);
        }
        qb.push(")");

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Path-prefix search within a bucket, newest first.
    pub async fn search(
        &self,
        bucket: &str,
        path_prefix: &str,
        tenant: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Document>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT * FROM documents WHERE is_deleted = 0 AND bucket = ",
        );
        qb.push_bind(bucket);
        qb.push(" AND path LIKE ")
            .push_bind(format!("{}%", escape_like(path_prefix)))
            .push(" ESCAPE '\\'");
        if let Some(t) = tenant {
            qb.push(" AND tenant_id = ").push_bind(t);
        }
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(limit.max(1));

        let docs = qb.build_query_as::<Document>().fetch_all(&self.pool).await?;
        Ok(docs)
    }

    pub async fn stats_by_bucket(
        &self,
        bucket: &str,
        tenant: Option<&str>,
    ) -> Result<DocumentStats> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT COUNT(*) AS document_count, COALESCE(SUM(size_bytes), 0) AS total_bytes \
             FROM documents WHERE is_deleted = 0 AND bucket = ",
        );
        qb.push_bind(bucket);
        if let Some(t) = tenant {
            qb.push(" AND tenant_id = ").push_bind(t);
        }

        let stats = qb
            .build_query_as::<DocumentStats>()
            .fetch_one(&self.pool)
            .await?;
        Ok(stats)
    }

    pub async fn stats_by_tenant(&self, tenant: &str) -> Result<DocumentStats> {
        let stats = sqlx::query_as::<_, DocumentStats>(
            "SELECT COUNT(*) AS document_count, COALESCE(SUM(size_bytes), 0) AS total_bytes \
             FROM documents WHERE is_deleted = 0 AND tenant_id = ?",
        )
        .bind(tenant)
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }
}

/// Append a filter's conditions to a query ending in `WHERE is_deleted = 0`.
fn apply_filter<'args>(qb: &mut QueryBuilder<'args, Sqlite>, filter: &'args DocumentFilter) {
    if let Some(ref bucket) = filter.bucket {
        qb.push(" AND bucket = ").push_bind(bucket);
    }
    if let Some(ref provider) = filter.provider {
        qb.push(" AND provider = ").push_bind(provider);
    }
    if let Some(ref mime) = filter.mime_type {
        qb.push(" AND mime_type = ").push_bind(mime);
    }
    if let Some(ref prefix) = filter.mime_prefix {
        qb.push(" AND mime_type LIKE ")
            .push_bind(format!("{}%", escape_like(prefix)))
            .push(" ESCAPE '\\'");
    }
    if let Some(ref tenant) = filter.tenant_id {
        qb.push(" AND tenant_id = ").push_bind(tenant);
    }
    if let Some(ref user) = filter.user_id {
        qb.push(" AND user_id = ").push_bind(user);
    }
    if let Some(ref entity_type) = filter.entity_type {
        qb.push(" AND entity_type = ").push_bind(entity_type);
    }
    if let Some(ref entity_id) = filter.entity_id {
        qb.push(" AND entity_id = ").push_bind(entity_id);
    }
    if let Some(is_public) = filter.is_public {
        qb.push(" AND is_public = ").push_bind(is_public);
    }
    if let Some(min) = filter.min_size_bytes {
        qb.push(" AND size_bytes >= ").push_bind(min);
    }
    if let Some(max) = filter.max_size_bytes {
        qb.push(" AND size_bytes <= ").push_bind(max);
    }
    if let Some(after) = filter.created_after {
        qb.push(" AND created_at >= ").push_bind(after);
    }
    if let Some(before) = filter.created_before {
        qb.push(" AND created_at <= ").push_bind(before);
    }
    if let Some((ref key, ref value)) = filter.tag_equals {
        qb.push(" AND json_extract(tags, '$.' || ")
            .push_bind(key)
            .push(") = ")
            .push_bind(value);
    }
    if let Some(ref key) = filter.tag_exists {
        qb.push(" AND json_type(tags, '$.' || ")
            .push_bind(key)
            .push(") IS NOT NULL");
    }
}

/// Escape LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;

    fn sample(bucket: &str, path: &str, tenant: Option<&str>) -> NewDocument {
        NewDocument {
            bucket: bucket.into(),
            path: path.into(),
            original_filename: "report.pdf".into(),
            storage_filename: path.rsplit('/').next().unwrap_or(path).into(),
            mime_type: "application/pdf".into(),
            size_bytes: 1024,
            checksum_sha256: "ab".repeat(32),
            entity_type: None,
            entity_id: None,
            media_type: None,
            position: None,
            is_public: false,
            tenant_id: tenant.map(String::from),
            user_id: Some("u-1".into()),
            product_id: None,
            provider: "filesystem".into(),
            tags: HashMap::new(),
        }
    }

    async fn service() -> DocumentService {
        DocumentService::new(create_memory_pool().await.unwrap())
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let svc = service().await;
        let doc = svc.create(sample("docs", "2026/a.pdf", None)).await.unwrap();

        let by_id = svc.get_by_id(doc.id, None).await.unwrap();
        assert_eq!(by_id.path, "2026/a.pdf");

        let by_path = svc.get_by_path("docs", "2026/a.pdf", None).await.unwrap();
        assert_eq!(by_path.id, doc.id);
    }

    #[tokio::test]
    async fn test_duplicate_path_conflicts() {
        let svc = service().await;
        svc.create(sample("docs", "dup.pdf", None)).await.unwrap();

        let err = svc.create(sample("docs", "dup.pdf", None)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);

        // Same path in another bucket is fine
        svc.create(sample("other", "dup.pdf", None)).await.unwrap();
    }

    #[tokio::test]
    async fn test_path_reusable_after_soft_delete() {
        let svc = service().await;
        let doc = svc.create(sample("docs", "reuse.pdf", None)).await.unwrap();
        svc.soft_delete(doc.id, None).await.unwrap();

        // The partial unique index only covers live rows
        svc.create(sample("docs", "reuse.pdf", None)).await.unwrap();
    }

    #[tokio::test]
    async fn test_soft_delete_hides_document() {
        let svc = service().await;
        let doc = svc.create(sample("docs", "gone.pdf", None)).await.unwrap();
        svc.soft_delete(doc.id, None).await.unwrap();

        let err = svc.get_by_id(doc.id, None).await.unwrap_err();
        assert!(err.is_not_found());
        let err = svc.get_by_path("docs", "gone.pdf", None).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_tenant_isolation() {
        let svc = service().await;
        let doc = svc
            .create(sample("docs", "acme.pdf", Some("acme")))
            .await
            .unwrap();

        // Correct tenant sees it
        svc.get_by_id(doc.id, Some("acme")).await.unwrap();
        // Another tenant does not
        let err = svc.get_by_id(doc.id, Some("globex")).await.unwrap_err();
        assert!(err.is_not_found());

        let acme = svc
            .list(&DocumentFilter {
                tenant_id: Some("acme".into()),
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(acme.len(), 1);

        let globex = svc
            .list(&DocumentFilter {
                tenant_id: Some("globex".into()),
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(globex.is_empty());
    }

    #[tokio::test]
    async fn test_update_partial() {
        let svc = service().await;
        let doc = svc.create(sample("docs", "upd.pdf", None)).await.unwrap();

        let updated = svc
            .update(
                doc.id,
                None,
                DocumentUpdate {
                    is_public: Some(true),
                    media_type: Some("invoice".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(updated.is_public);
        assert_eq!(updated.media_type.as_deref(), Some("invoice"));
        // Untouched fields survive
        assert_eq!(updated.original_filename, "report.pdf");
        assert!(updated.updated_at >= doc.updated_at);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let svc = service().await;

        let mut png = sample("docs", "img/logo.png", None);
        png.mime_type = "image/png".into();
        png.size_bytes = 10;
        png.tags.insert("department".into(), "design".into());
        svc.create(png).await.unwrap();

        let mut jpg = sample("docs", "img/photo.jpg", None);
        jpg.mime_type = "image/jpeg".into();
        jpg.size_bytes = 5000;
        svc.create(jpg).await.unwrap();

        svc.create(sample("docs", "doc/report.pdf", None)).await.unwrap();

        // MIME prefix
        let images = svc
            .list(&DocumentFilter {
                bucket: Some("docs".into()),
                mime_prefix: Some("image/".into()),
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(images.len(), 2);

        // Size range
        let small = svc
            .list(&DocumentFilter {
                bucket: Some("docs".into()),
                max_size_bytes: Some(100),
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(small.len(), 1);
        assert_eq!(small[0].path, "img/logo.png");

        // Tag equality and presence
        let tagged = svc
            .list(&DocumentFilter {
                tag_equals: Some(("department".into(), "design".into())),
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(tagged.len(), 1);

        let has_tag = svc
            .list(&DocumentFilter {
                tag_exists: Some("department".into()),
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(has_tag.len(), 1);

        let no_match = svc
            .list(&DocumentFilter {
                tag_equals: Some(("department".into(), "sales".into())),
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(no_match.is_empty());
    }

    #[tokio::test]
    async fn test_list_pagination() {
        let svc = service().await;
        for i in 0..5 {
            svc.create(sample("docs", &format!("p/{i}.pdf"), None))
                .await
                .unwrap();
        }

        let page1 = svc
            .list(&DocumentFilter {
                bucket: Some("docs".into()),
                limit: 2,
                offset: 0,
                ..Default::default()
            })
            .await
            .unwrap();
        let page2 = svc
            .list(&DocumentFilter {
                bucket: Some("docs".into()),
                limit: 2,
                offset: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        let page3 = svc
            .list(&DocumentFilter {
                bucket: Some("docs".into()),
                limit: 2,
                offset: 4,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page1.len(), 2);
        assert_eq!(page2.len(), 2);
        assert_eq!(page3.len(), 1);

        let mut seen: Vec<_> = page1
            .iter()
            .chain(&page2)
            .chain(&page3)
            .map(|d| d.path.clone())
            .collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 5);
    }

    #[tokio::test]
    async fn test_count_ignores_pagination() {
        let svc = service().await;
        for i in 0..5 {
            svc.create(sample("docs", &format!("c/{i}.pdf"), None))
                .await
                .unwrap();
        }

        let filter = DocumentFilter {
            bucket: Some("docs".into()),
            limit: 2,
            offset: 4,
            ..Default::default()
        };
        assert_eq!(svc.count(&filter).await.unwrap(), 5);
        assert_eq!(svc.list(&filter).await.unwrap().len(), 1);

        let none = DocumentFilter {
            bucket: Some("empty".into()),
            limit: 10,
            ..Default::default()
        };
        assert_eq!(svc.count(&none).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_location_keeps_id() {
        let svc = service().await;
        let doc = svc.create(sample("docs", "old/a.pdf", None)).await.unwrap();

        let moved = svc
            .update_location(doc.id, None, "archive", "new/a.pdf")
            .await
            .unwrap();
        assert_eq!(moved.id, doc.id);
        assert_eq!(moved.bucket, "archive");
        assert_eq!(moved.path, "new/a.pdf");
        assert_eq!(moved.created_at, doc.created_at);

        // Old location no longer resolves
        let err = svc.get_by_path("docs", "old/a.pdf", None).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_location_conflicts_on_occupied_target() {
        let svc = service().await;
        let doc = svc.create(sample("docs", "mv/src.pdf", None)).await.unwrap();
        svc.create(sample("docs", "mv/dst.pdf", None)).await.unwrap();

        let err = svc
            .update_location(doc.id, None, "docs", "mv/dst.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_update_location_is_tenant_scoped() {
        let svc = service().await;
        let doc = svc
            .create(sample("docs", "t/a.pdf", Some("acme")))
            .await
            .unwrap();

        let err = svc
            .update_location(doc.id, Some("globex"), "docs", "t/b.pdf")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        // Unchanged for the owner
        svc.get_by_path("docs", "t/a.pdf", Some("acme")).await.unwrap();
    }

    #[tokio::test]
    async fn test_batch_soft_delete() {
        let svc = service().await;
        for name in ["a.pdf", "b.pdf", "c.pdf"] {
            svc.create(sample("docs", name, None)).await.unwrap();
        }

        let affected = svc
            .batch_soft_delete(
                "docs",
                &["a.pdf".into(), "b.pdf".into(), "missing.pdf".into()],
                None,
            )
            .await
            .unwrap();
        assert_eq!(affected, 2);

        let remaining = svc.list(&DocumentFilter::in_bucket("docs")).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].path, "c.pdf");
    }

    #[tokio::test]
    async fn test_search_prefix() {
        let svc = service().await;
        svc.create(sample("docs", "2026/01/a.pdf", None)).await.unwrap();
        svc.create(sample("docs", "2026/02/b.pdf", None)).await.unwrap();
        svc.create(sample("docs", "2025/12/c.pdf", None)).await.unwrap();

        let hits = svc.search("docs", "2026/", None, 10).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|d| d.path.starts_with("2026/")));
    }

    #[tokio::test]
    async fn test_stats() {
        let svc = service().await;
        let mut a = sample("docs", "s/a.pdf", Some("acme"));
        a.size_bytes = 100;
        svc.create(a).await.unwrap();
        let mut b = sample("docs", "s/b.pdf", Some("acme"));
        b.size_bytes = 50;
        svc.create(b).await.unwrap();
        let mut c = sample("media", "s/c.pdf", Some("globex"));
        c.size_bytes = 7;
        svc.create(c).await.unwrap();

        let bucket_stats = svc.stats_by_bucket("docs", None).await.unwrap();
        assert_eq!(bucket_stats.document_count, 2);
        assert_eq!(bucket_stats.total_bytes, 150);

        let tenant_stats = svc.stats_by_tenant("acme").await.unwrap();
        assert_eq!(tenant_stats.document_count, 2);
        assert_eq!(tenant_stats.total_bytes, 150);

        let empty = svc.stats_by_bucket("nope", None).await.unwrap();
        assert_eq!(empty.document_count, 0);
        assert_eq!(empty.total_bytes, 0);
    }

    #[tokio::test]
    async fn test_like_escape() {
        assert_eq!(escape_like("100%_done"), "100\\%\\_done");
        assert_eq!(escape_like("plain"), "plain");
    }
}
