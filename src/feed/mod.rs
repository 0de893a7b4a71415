use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

pub mod fetcher;
pub mod normalizer;

pub use fetcher::{FeedFetcher, FetchError, HttpFetcher};
pub use normalizer::{normalize, ParseError};

/// One `<entry>` of a department's Atom feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: String,
    pub title: String,
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<FixedOffset>>,
    pub updated: DateTime<FixedOffset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Entries of one feed, in document order (most recent first on gov.uk).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedFeed(pub Vec<FeedItem>);

impl NormalizedFeed {
    pub fn items(&self) -> &[FeedItem] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
