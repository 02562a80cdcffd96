//! Application configuration loaded from environment variables.

use crate::error::{AppError, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Log level
    pub log_level: String,

    /// Storage provider: "filesystem", "s3", "gcs", or "azure"
    pub storage_provider: String,

    /// Filesystem storage root (when storage_provider = "filesystem")
    pub storage_path: String,

    /// S3 / S3-compatible region
    pub s3_region: Option<String>,

    /// S3 endpoint URL (for MinIO or other S3-compatible services)
    pub s3_endpoint: Option<String>,

    /// GCS project ID
    pub gcs_project_id: Option<String>,

    /// GCS service account email used for V4 URL signing
    pub gcs_service_account_email: Option<String>,

    /// GCS RSA private key (PEM) or path to it
    pub gcs_private_key: Option<String>,

    /// Azure storage account name
    pub azure_account: Option<String>,

    /// Azure storage account access key (base64 encoded)
    pub azure_access_key: Option<String>,

    /// Azure custom endpoint (Azure Government, Azurite, etc.)
    pub azure_endpoint: Option<String>,

    /// Maximum accepted upload size in bytes
    pub max_upload_size_bytes: u64,

    /// MIME type allow-list; exact entries or wildcard prefixes like "image/*"
    pub allowed_mime_types: Vec<String>,

    /// Cache presigned GET URLs
    pub presign_cache_enabled: bool,

    /// Default presigned URL expiry in seconds
    pub presign_default_expiry_secs: u64,

    /// Expiry for public URLs recorded at upload time, in seconds
    pub public_url_expiry_secs: u64,

    /// Future extension flag; parsed but not acted upon
    pub virus_scan_enabled: bool,

    /// Future extension flag; parsed but not acted upon
    pub replication_enabled: bool,
}

const DEFAULT_MAX_UPLOAD_SIZE: u64 = 100 * 1024 * 1024;
const DEFAULT_PRESIGN_EXPIRY_SECS: u64 = 3600;
const DEFAULT_PUBLIC_URL_EXPIRY_SECS: u64 = 604_800;

impl Config {
    /// Load configuration from environment variables, reading a `.env`
    /// file first when one is present
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let allowed_mime_types = env::var("ALLOWED_MIME_TYPES")
            .unwrap_or_else(|_| "*/*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://docvault.db?mode=rwc".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            storage_provider: env::var("STORAGE_PROVIDER").unwrap_or_else(|_| "filesystem".into()),
            storage_path: env::var("STORAGE_PATH")
                .unwrap_or_else(|_| "/var/lib/docvault/objects".into()),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            gcs_project_id: env::var("GCS_PROJECT_ID").ok(),
            gcs_service_account_email: env::var("GCS_SERVICE_ACCOUNT_EMAIL").ok(),
            gcs_private_key: load_pem_var("GCS_PRIVATE_KEY"),
            azure_account: env::var("AZURE_STORAGE_ACCOUNT").ok(),
            azure_access_key: env::var("AZURE_STORAGE_ACCESS_KEY").ok(),
            azure_endpoint: env::var("AZURE_STORAGE_ENDPOINT").ok(),
            max_upload_size_bytes: parse_env("MAX_UPLOAD_SIZE_BYTES", DEFAULT_MAX_UPLOAD_SIZE),
            allowed_mime_types,
            presign_cache_enabled: parse_flag("PRESIGN_CACHE_ENABLED", true),
            presign_default_expiry_secs: parse_env(
                "PRESIGN_DEFAULT_EXPIRY_SECS",
                DEFAULT_PRESIGN_EXPIRY_SECS,
            ),
            public_url_expiry_secs: parse_env(
                "PUBLIC_URL_EXPIRY_SECS",
                DEFAULT_PUBLIC_URL_EXPIRY_SECS,
            ),
            virus_scan_enabled: parse_flag("VIRUS_SCAN_ENABLED", false),
            replication_enabled: parse_flag("REPLICATION_ENABLED", false),
        })
    }

    /// Require a configuration value, failing with a descriptive error
    pub fn require<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
        value
            .as_deref()
            .ok_or_else(|| AppError::Config(format!("{} not set", name)))
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|v| v.to_lowercase() == "true" || v == "1")
        .unwrap_or(default)
}

/// Load a PEM value from `{NAME}_PATH` (file) or `{NAME}` (inline).
fn load_pem_var(name: &str) -> Option<String> {
    if let Ok(path) = env::var(format!("{}_PATH", name)) {
        match std::fs::read_to_string(&path) {
            Ok(key) => return Some(key),
            Err(e) => {
                tracing::warn!("Failed to read {} from {}: {}", name, path, e);
            }
        }
    }
    env::var(name).ok()
}
