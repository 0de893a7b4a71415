use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{CacheEntry, CacheError, ExpiringCache};

/// Process-local backend. Entries are replaced whole, so a reader sees either
/// the previous or the new entry.
pub struct MemoryCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V> MemoryCache<V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<V> Default for MemoryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl<V> ExpiringCache<V> for MemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn load(&self, key: &str) -> Result<Option<V>, CacheError> {
        let entries = self.entries.read().await;

        match entries.get(key) {
            Some(entry) if !entry.is_expired_at(Utc::now()) => {
                tracing::debug!(key, "cache hit");
                Ok(Some(entry.value.clone()))
            }
            Some(_) => {
                tracing::debug!(key, "cache entry expired");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn save(&self, key: &str, value: V, expires_at: DateTime<Utc>) -> Result<(), CacheError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), CacheEntry { value, expires_at });

        tracing::debug!(key, %expires_at, "set cache");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    #[tokio::test]
    async fn load_missing_key() {
        let cache = MemoryCache::<String>::new();
        assert_eq!(cache.load("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_then_load_before_expiry() {
        let cache = MemoryCache::new();
        let expires_at = Utc::now() + TimeDelta::hours(1);

        cache.save("k", 7u32, expires_at).await.unwrap();
        assert_eq!(cache.load("k").await.unwrap(), Some(7));
    }

    #[tokio::test]
    async fn expiry_is_checked_on_read() {
        let cache = MemoryCache::new();

        cache.save("k", 7u32, Utc::now()).await.unwrap();
        assert_eq!(cache.load("k").await.unwrap(), None);

        cache
            .save("k", 8u32, Utc::now() + TimeDelta::milliseconds(50))
            .await
            .unwrap();
        assert_eq!(cache.load("k").await.unwrap(), Some(8));

        tokio::time::sleep(std::time::Duration::from_millis(80)).await;
        assert_eq!(cache.load("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_overwrites_unconditionally() {
        let cache = MemoryCache::new();
        let later = Utc::now() + TimeDelta::hours(2);
        let sooner = Utc::now() + TimeDelta::hours(1);

        cache.save("k", "old", later).await.unwrap();
        cache.save("k", "new", sooner).await.unwrap();

        assert_eq!(cache.load("k").await.unwrap(), Some("new"));
    }
}
