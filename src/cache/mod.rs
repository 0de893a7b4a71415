use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod memory;
mod redis;

pub use memory::MemoryCache;
pub use redis::RedisCache;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] fred::error::RedisError),
    #[error("cached value could not be (de)serialized: {0}")]
    Serde(#[from] serde_json::Error),
}

/// A stored value together with the instant it stops being served.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    pub value: V,
    pub expires_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Key-value storage where every entry carries an absolute expiry.
///
/// Expiry is evaluated when reading: `load` returns `None` once
/// `now >= expires_at`. `save` always overwrites the previous entry.
#[async_trait::async_trait]
pub trait ExpiringCache<V>: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<V>, CacheError>;

    async fn save(&self, key: &str, value: V, expires_at: DateTime<Utc>) -> Result<(), CacheError>;
}
