//! TTL cache for presigned URLs.
//!
//! Presigned URLs are expensive to mint on the cloud backends (RSA or HMAC
//! signing per call) and safe to reuse until they expire. Entries carry
//! the URL's own absolute expiry: the cache evicts them at 90% of that
//! lifetime and re-validates on read, so a cached URL always has usable
//! life left and can never outlive the credential embedded in it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use moka::Expiry;
use std::sync::Arc;
use std::time::{Duration, Instant};

// Fraction of a URL's remaining life an entry may spend in the cache
const CACHE_LIFETIME_FRACTION: f64 = 0.9;

/// A cached presigned URL together with the moment the URL itself expires.
#[derive(Debug, Clone)]
pub struct CachedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedUrl {
    pub fn new(url: String, valid_for: Duration) -> Self {
        Self {
            url,
            expires_at: Utc::now() + chrono::Duration::seconds(valid_for.as_secs() as i64),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Cache abstraction used by the orchestrator for presigned URLs.
#[async_trait]
pub trait UrlCache: Send + Sync {
    /// Look up a URL; never returns an expired entry.
    async fn get(&self, key: &str) -> Option<CachedUrl>;

    async fn put(&self, key: String, value: CachedUrl);

    async fn invalidate(&self, key: &str);
}

/// Per-entry expiry driven by the value's own `expires_at`: entries live
/// for 90% of the URL's remaining validity, keeping the cache TTL strictly
/// shorter than the credential it wraps.
struct UrlExpiry;

impl Expiry<String, CachedUrl> for UrlExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedUrl,
        _created_at: Instant,
    ) -> Option<Duration> {
        let remaining = (value.expires_at - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO);
        Some(remaining.mul_f64(CACHE_LIFETIME_FRACTION))
    }
}

/// moka-backed cache with per-entry TTL.
pub struct MokaUrlCache {
    inner: Cache<String, CachedUrl>,
}

impl MokaUrlCache {
    pub fn new(max_capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(UrlExpiry)
            .build();
        Self { inner }
    }
}

#[async_trait]
impl UrlCache for MokaUrlCache {
    async fn get(&self, key: &str) -> Option<CachedUrl> {
        let entry = self.inner.get(key).await?;
        // Belt and braces: moka eviction is not instantaneous
        if entry.is_expired() {
            self.inner.invalidate(key).await;
            return None;
        }
        Some(entry)
    }

    async fn put(&self, key: String, value: CachedUrl) {
        self.inner.insert(key, value).await;
    }

    async fn invalidate(&self, key: &str) {
        self.inner.invalidate(key).await;
    }
}

/// Cache that never hits; used when PRESIGN_CACHE_ENABLED=false.
pub struct NoopCache;

#[async_trait]
impl UrlCache for NoopCache {
    async fn get(&self, _key: &str) -> Option<CachedUrl> {
        None
    }

    async fn put(&self, _key: String, _value: CachedUrl) {}

    async fn invalidate(&self, _key: &str) {}
}

/// Pick the cache implementation from configuration.
pub fn create_cache(enabled: bool) -> Arc<dyn UrlCache> {
    if enabled {
        tracing::info!("Presigned URL cache enabled");
        Arc::new(MokaUrlCache::new(10_000))
    } else {
        tracing::info!("Presigned URL cache disabled");
        Arc::new(NoopCache)
    }
}
