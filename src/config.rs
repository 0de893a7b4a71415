use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use ::config::{Environment, File};
use anyhow::Context as _;
use chrono::{TimeDelta, Utc};
use serde::Deserialize;

use crate::aggregator::RefreshPolicy;
use crate::departments::{Catalog, Department};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tracing filter directive, e.g. `info` or `govreader_api=debug`.
    pub level: String,
    pub api: ApiConfig,
    pub feeds: FeedsConfig,
    pub cache: CacheConfig,
    /// Replaces the built-in department list when non-empty.
    pub departments: Vec<Department>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub bind: SocketAddr,
    pub cors_origin: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedsConfig {
    pub base_url: String,
    pub user_agent: String,
    pub ttl_secs: u64,
    pub fetch_timeout_secs: u64,
    pub refresh_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub redis_url: String,
    pub redis_database: u8,
    pub key_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            api: ApiConfig::default(),
            feeds: FeedsConfig::default(),
            cache: CacheConfig::default(),
            departments: Vec::new(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8000)),
            cors_origin: "http://jkhntr.com/govreader".to_string(),
        }
    }
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.gov.uk/government/organisations".to_string(),
            user_agent: concat!("govreader-api/", env!("CARGO_PKG_VERSION")).to_string(),
            ttl_secs: 3600,
            fetch_timeout_secs: 10,
            refresh_timeout_secs: 30,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            redis_database: 0,
            key_prefix: "govreader:".to_string(),
        }
    }
}

impl Config {
    /// Layered load: `config/default.yaml`, the `RUN_ENV` specific file,
    /// `config/local.yaml`, then `APP__` prefixed environment variables.
    pub fn load() -> anyhow::Result<Self> {
        let environment = env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        let config_file = match environment.as_str() {
            "production" => "prod",
            _ => "dev",
        };

        let config = ::config::Config::builder()
            .add_source(File::with_name("config/default.yaml").required(false))
            .add_source(File::with_name(&format!("config/{}.yaml", config_file)).required(false))
            .add_source(File::with_name("config/local.yaml").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()
            .context("reading configuration")?;

        let config: Self = config.try_deserialize().context("parsing configuration")?;
        config.feeds.refresh_policy()?;

        Ok(config)
    }

    pub fn catalog(&self) -> anyhow::Result<Catalog> {
        if self.departments.is_empty() {
            return Ok(Catalog::default());
        }

        Catalog::new(self.departments.clone()).context("invalid department list")
    }
}

impl FeedsConfig {
    /// Fails if `ttl_secs` cannot be added to the current time.
    pub fn refresh_policy(&self) -> anyhow::Result<RefreshPolicy> {
        let ttl = i64::try_from(self.ttl_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
            .with_context(|| format!("feeds.ttl_secs out of range: {}", self.ttl_secs))?;

        Ok(RefreshPolicy {
            ttl,
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            refresh_timeout: Duration::from_secs(self.refresh_timeout_secs),
        })
    }
}
