//! Document model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use std::collections::HashMap;
use uuid::Uuid;

/// Durable metadata for one stored document
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Document {
    pub id: Uuid,
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
    pub public_url: Option<String>,
    pub tenant_id: Option<String>,
    pub user_id: Option<String>,
    pub product_id: Option<String>,
    pub provider: String,
    pub tags: Json<HashMap<String, String>>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted by a metadata update; `None` leaves the column unchanged
#[derive(Debug, Clone, Default)]
pub struct DocumentUpdate {
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub media_type: Option<String>,
    pub position: Option<i64>,
    pub is_public: Option<bool>,
    pub public_url: Option<String>,
    pub tags: Option<HashMap<String, String>>,
}

/// Aggregate size/count statistics for a bucket or tenant
#[derive(Debug, Clone, Copy, FromRow, Serialize)]
pub struct DocumentStats {
    pub document_count: i64,
    pub total_bytes: i64,
}
