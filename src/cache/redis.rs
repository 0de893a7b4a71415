use anyhow::Result;
use chrono::{DateTime, Utc};
use fred::prelude::*;
use fred::types::{Expiration, PerformanceConfig, ReconnectPolicy, RedisConfig};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{CacheEntry, CacheError, ExpiringCache};

/// Redis backend. Values are stored as a JSON envelope carrying their
/// `expires_at`, with a matching `EXAT` so Redis drops them on its own.
#[derive(Clone)]
pub struct RedisCache {
    client: RedisClient,
    key_prefix: String,
}

impl RedisCache {
    pub async fn new(url: &str, database: u8, key_prefix: &str) -> Result<Self> {
        let mut config = RedisConfig::from_url(url)?;

        config.database = Some(database);
        tracing::debug!("Using Redis database: {}", database);

        let client = RedisClient::new(
            config,
            Some(PerformanceConfig::default()),
            Some(ConnectionConfig::default()),
            Some(ReconnectPolicy::default()),
        );

        client.connect();
        client.wait_for_connect().await?;

        Ok(Self::from_client(client, key_prefix))
    }

    pub fn from_client(client: RedisClient, key_prefix: &str) -> Self {
        Self {
            client,
            key_prefix: key_prefix.to_string(),
        }
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

/// Serializes an entry into its stored envelope and the `EXAT` timestamp that
/// goes with it.
fn encode<V: Serialize>(entry: &CacheEntry<V>) -> Result<(String, i64), CacheError> {
    let payload = serde_json::to_string(entry)?;

    // EXAT has second resolution, round up so Redis never drops early
    let mut expire_at = entry.expires_at.timestamp();
    if entry.expires_at.timestamp_subsec_nanos() > 0 {
        expire_at += 1;
    }

    Ok((payload, expire_at.max(1)))
}

/// Reads an envelope back, `None` once it has expired at `now`.
fn decode<V: DeserializeOwned>(raw: &str, now: DateTime<Utc>) -> Result<Option<V>, CacheError> {
    let entry: CacheEntry<V> = serde_json::from_str(raw)?;

    if entry.is_expired_at(now) {
        return Ok(None);
    }

    Ok(Some(entry.value))
}

#[async_trait::async_trait]
impl<V> ExpiringCache<V> for RedisCache
where
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn load(&self, key: &str) -> Result<Option<V>, CacheError> {
        let key = self.key(key);
        let Some(raw) = self.client.get::<Option<String>, _>(&key).await? else {
            return Ok(None);
        };

        let value = decode(&raw, Utc::now())?;
        match value {
            Some(_) => tracing::debug!("Cache hit for key: {}", key),
            None => tracing::debug!("Cache entry expired for key: {}", key),
        }

        Ok(value)
    }

    async fn save(&self, key: &str, value: V, expires_at: DateTime<Utc>) -> Result<(), CacheError> {
        let key = self.key(key);
        let (payload, expire_at) = encode(&CacheEntry { value, expires_at })?;

        self.client
            .set::<(), _, _>(&key, payload, Some(Expiration::EXAT(expire_at)), None, false)
            .await?;

        tracing::debug!("Set cache for key: {}", key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::aggregator::Aggregate;

    fn aggregate() -> Aggregate {
        serde_json::from_value(serde_json::json!({
            "HMT": [{
                "id": "urn:hmt:1",
                "title": "Budget",
                "link": "https://www.gov.uk/government/news/budget",
                "published": "2024-04-29T08:30:00+01:00",
                "updated": "2024-05-02T10:15:00+01:00",
                "summary": "Chancellor sets out the budget."
            }],
            "HO": []
        }))
        .unwrap()
    }

    #[test]
    fn envelope_round_trips_an_aggregate() {
        let now = Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap();
        let entry = CacheEntry {
            value: aggregate(),
            expires_at: now + chrono::TimeDelta::hours(1),
        };

        let (payload, _) = encode(&entry).unwrap();
        let value: Option<Aggregate> = decode(&payload, now).unwrap();
        let value = value.expect("entry is not yet expired");

        assert_eq!(value, entry.value);

        let item = &value.get("HMT").unwrap().items()[0];
        assert_eq!(item.updated.to_rfc3339(), "2024-05-02T10:15:00+01:00");
        assert_eq!(
            item.published.map(|p| p.to_rfc3339()).as_deref(),
            Some("2024-04-29T08:30:00+01:00")
        );
    }

    #[test]
    fn expired_envelope_decodes_to_none() {
        let expires_at = Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap();
        let (payload, _) = encode(&CacheEntry {
            value: aggregate(),
            expires_at,
        })
        .unwrap();

        let at_expiry: Option<Aggregate> = decode(&payload, expires_at).unwrap();
        let after: Option<Aggregate> = decode(&payload, expires_at + chrono::TimeDelta::seconds(1)).unwrap();
        let before: Option<Aggregate> = decode(&payload, expires_at - chrono::TimeDelta::milliseconds(1)).unwrap();

        assert!(at_expiry.is_none());
        assert!(after.is_none());
        assert!(before.is_some());
    }

    #[test]
    fn expiry_seconds_round_up() {
        let whole = Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap();
        let fractional = whole + chrono::TimeDelta::milliseconds(250);

        let (_, exat) = encode(&CacheEntry { value: 1u8, expires_at: fractional }).unwrap();
        assert_eq!(exat, whole.timestamp() + 1);

        let (_, exat) = encode(&CacheEntry { value: 1u8, expires_at: whole }).unwrap();
        assert_eq!(exat, whole.timestamp());
    }

    #[test]
    fn malformed_envelope_is_an_error() {
        let err = decode::<Aggregate>("{\"value\": {}}", Utc::now()).unwrap_err();

        assert!(matches!(err, CacheError::Serde(_)));
    }
}
