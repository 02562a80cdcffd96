//! docvault: multi-tenant document storage backend.
//!
//! Byte payloads live in a pluggable object-storage backend (local
//! filesystem, S3, GCS, or Azure Blob); document metadata lives in a
//! relational store. A storage orchestrator keeps the two in step with
//! two-phase writes and compensating deletes, and serves presigned URLs
//! through a TTL cache.

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, Result};
