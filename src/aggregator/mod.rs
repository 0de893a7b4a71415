use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{TimeDelta, Utc};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::cache::ExpiringCache;
use crate::departments::{Catalog, Department};
use crate::error::FeedError;
use crate::feed::{normalize, FeedFetcher, NormalizedFeed};


/// The single cache slot holding every department's feed.
pub const CACHE_KEY: &str = "department-feeds";

/// Every department's feed from one successful refresh, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Aggregate(HashMap<String, NormalizedFeed>);

impl Aggregate {
    pub fn get(&self, id: &str) -> Option<&NormalizedFeed> {
        self.0.get(id)
    }

    /// An aggregate written under a different catalog is not usable.
    pub fn covers(&self, catalog: &Catalog) -> bool {
        catalog.all().iter().all(|d| self.0.contains_key(&d.id))
    }
}

/// A department's metadata joined with its current feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseItem {
    pub id: String,
    pub name: String,
    pub hex: String,
    pub feed: NormalizedFeed,
}

impl ResponseItem {
    fn new(department: &Department, aggregate: &Aggregate) -> Self {
        Self {
            id: department.id.clone(),
            name: department.name.clone(),
            hex: department.hex.clone(),
            feed: aggregate.get(&department.id).cloned().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RefreshPolicy {
    /// How long a refreshed aggregate is served before the next refresh.
    pub ttl: TimeDelta,
    pub fetch_timeout: Duration,
    /// Bound on the whole fan-out, across all departments.
    pub refresh_timeout: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            ttl: TimeDelta::hours(1),
            fetch_timeout: Duration::from_secs(10),
            refresh_timeout: Duration::from_secs(30),
        }
    }
}

type RefreshOutcome = Result<Arc<Aggregate>, FeedError>;

pub struct Aggregator {
    catalog: Arc<Catalog>,
    fetcher: Arc<dyn FeedFetcher>,
    cache: Arc<dyn ExpiringCache<Aggregate>>,
    policy: RefreshPolicy,
    /// Bumped each time a refresh finishes, successful or not.
    generation: AtomicU64,
    /// Callers between reading `generation` and acquiring `last_refresh`.
    waiting: AtomicUsize,
    /// Held for the duration of a refresh. Keeps the last outcome only while
    /// callers that queued behind it have yet to pick it up.
    last_refresh: Mutex<Option<RefreshOutcome>>,
}

/// Counts a caller in `Aggregator::waiting` until it holds the refresh lock.
struct Waiting<'a>(&'a AtomicUsize);

impl<'a> Waiting<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }

    /// Returns true if no other caller is still queued.
    fn leave(self) -> bool {
        let last = self.0.fetch_sub(1, Ordering::SeqCst) == 1;
        std::mem::forget(self);
        last
    }
}

impl Drop for Waiting<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Aggregator {
    pub fn new(
        catalog: Arc<Catalog>,
        fetcher: Arc<dyn FeedFetcher>,
        cache: Arc<dyn ExpiringCache<Aggregate>>,
        policy: RefreshPolicy,
    ) -> Self {
        Self {
            catalog,
            fetcher,
            cache,
            policy,
            generation: AtomicU64::new(0),
            waiting: AtomicUsize::new(0),
            last_refresh: Mutex::new(None),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_department(&self, id: &str) -> Result<ResponseItem, FeedError> {
        let department = self
            .catalog
            .lookup(id)
            .ok_or_else(|| FeedError::UnknownDepartment(id.to_string()))?;

        let aggregate = self.current().await?;

        Ok(ResponseItem::new(department, &aggregate))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_all(&self) -> Result<Vec<ResponseItem>, FeedError> {
        let aggregate = self.current().await?;

        Ok(self
            .catalog
            .all()
            .iter()
            .map(|department| ResponseItem::new(department, &aggregate))
            .collect())
    }

    /// Returns a non-expired aggregate, refreshing it if needed.
    ///
    /// At most one refresh runs at a time. Callers that find the cache empty
    /// while a refresh is running wait for it and share its outcome.
    async fn current(&self) -> RefreshOutcome {
        if let Some(aggregate) = self.load_cached().await {
            return Ok(aggregate);
        }

        let waiting = Waiting::enter(&self.waiting);
        let observed = self.generation.load(Ordering::SeqCst);
        let mut last_refresh = self.last_refresh.lock().await;
        let last_waiter = waiting.leave();

        // the last caller out clears the slot whether or not it needed it
        let shared = if last_waiter {
            last_refresh.take()
        } else {
            last_refresh.clone()
        };

        if self.generation.load(Ordering::SeqCst) != observed {
            if let Some(outcome) = shared {
                tracing::debug!("using refresh that completed while waiting");
                return outcome;
            }
        }

        if let Some(aggregate) = self.load_cached().await {
            return Ok(aggregate);
        }

        let outcome = self.refresh().await.map(Arc::new);
        if let Ok(aggregate) = &outcome {
            self.store(aggregate).await;
        }

        self.generation.fetch_add(1, Ordering::SeqCst);
        // callers that start waiting from here on observe the new generation
        *last_refresh = if self.waiting.load(Ordering::SeqCst) > 0 {
            Some(outcome.clone())
        } else {
            None
        };

        outcome
    }

    async fn load_cached(&self) -> Option<Arc<Aggregate>> {
        match self.cache.load(CACHE_KEY).await {
            Ok(Some(aggregate)) if aggregate.covers(&self.catalog) => Some(Arc::new(aggregate)),
            Ok(Some(_)) => {
                tracing::warn!("cached feeds do not cover every department, refreshing");
                None
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load cached feeds, refreshing");
                None
            }
        }
    }

    async fn store(&self, aggregate: &Aggregate) {
        let Some(expires_at) = Utc::now().checked_add_signed(self.policy.ttl) else {
            tracing::error!(ttl = %self.policy.ttl, "cache expiry out of range, not caching department feeds");
            return;
        };

        if let Err(e) = self.cache.save(CACHE_KEY, aggregate.clone(), expires_at).await {
            tracing::error!(error = %e, "failed to cache department feeds");
        }
    }

    #[tracing::instrument(skip_all, fields(departments = self.catalog.len()))]
    async fn refresh(&self) -> Result<Aggregate, FeedError> {
        tracing::info!("refreshing department feeds");
        let started = Instant::now();

        let pipelines = self.catalog.all().iter().map(|d| self.fetch_department(d));
        let outcomes = tokio::time::timeout(self.policy.refresh_timeout, join_all(pipelines))
            .await
            .map_err(|_| {
                tracing::error!(timeout = ?self.policy.refresh_timeout, "refresh timed out");
                FeedError::RefreshTimeout(self.policy.refresh_timeout)
            })?;

        let mut feeds = HashMap::with_capacity(self.catalog.len());
        for (department, outcome) in self.catalog.all().iter().zip(outcomes) {
            feeds.insert(department.id.clone(), outcome?);
        }

        tracing::info!(elapsed = ?started.elapsed(), "refreshed department feeds");
        Ok(Aggregate(feeds))
    }

    async fn fetch_department(&self, department: &Department) -> Result<NormalizedFeed, FeedError> {
        let timeout = self.policy.fetch_timeout;
        let timed_out = || FeedError::FetchTimeout {
            department: department.id.clone(),
            after: timeout,
        };

        let raw = match tokio::time::timeout(timeout, self.fetcher.fetch(department)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) if e.is_timeout() => {
                tracing::error!(department = %department.id, error = %e, "feed request timed out");
                return Err(timed_out());
            }
            Ok(Err(e)) => {
                tracing::error!(department = %department.id, error = %e, "failed to fetch feed");
                return Err(FeedError::Fetch {
                    department: department.id.clone(),
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                tracing::error!(department = %department.id, ?timeout, "feed request timed out");
                return Err(timed_out());
            }
        };

        normalize(&raw).map_err(|e| {
            tracing::error!(department = %department.id, error = %e, "failed to parse feed");
            FeedError::Parse {
                department: department.id.clone(),
                reason: e.to_string(),
            }
        })
    }
}
