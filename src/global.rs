use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;

use crate::aggregator::{Aggregate, Aggregator};
use crate::cache::{ExpiringCache, MemoryCache, RedisCache};
use crate::config::{CacheBackend, Config};
use crate::feed::HttpFetcher;

pub struct Global {
    pub config: Config,
    pub aggregator: Aggregator,
    pub started_at: std::time::Instant,
}

impl Global {
    pub async fn init(config: Config) -> anyhow::Result<Arc<Self>> {
        let catalog = Arc::new(config.catalog()?);

        tracing::info!(departments = catalog.len(), "loaded department catalog");

        let fetcher = HttpFetcher::new(
            &config.feeds.base_url,
            &config.feeds.user_agent,
            Duration::from_secs(config.feeds.fetch_timeout_secs),
        )?;

        let cache: Arc<dyn ExpiringCache<Aggregate>> = match config.cache.backend {
            CacheBackend::Memory => Arc::new(MemoryCache::new()),
            CacheBackend::Redis => {
                let redis = RedisCache::new(
                    &config.cache.redis_url,
                    config.cache.redis_database,
                    &config.cache.key_prefix,
                )
                .await
                .context("redis connect")?;

                tracing::info!("connected to redis");
                Arc::new(redis)
            }
        };

        let aggregator = Aggregator::new(
            catalog,
            Arc::new(fetcher),
            cache,
            config.feeds.refresh_policy()?,
        );

        Ok(Self::new(config, aggregator))
    }

    pub fn new(config: Config, aggregator: Aggregator) -> Arc<Self> {
        Arc::new(Self {
            config,
            aggregator,
            started_at: std::time::Instant::now(),
        })
    }
}
