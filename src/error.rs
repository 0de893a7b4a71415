use std::time::Duration;

/// Failures surfaced by feed queries.
///
/// `Clone` so that a single refresh outcome can be handed to every caller
/// that was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    #[error("unrecognised department id: {0}")]
    UnknownDepartment(String),
    #[error("failed to fetch feed for {department}: {reason}")]
    Fetch { department: String, reason: String },
    #[error("failed to parse feed for {department}: {reason}")]
    Parse { department: String, reason: String },
    #[error("fetching feed for {department} timed out after {after:?}")]
    FetchTimeout { department: String, after: Duration },
    #[error("refreshing department feeds timed out after {0:?}")]
    RefreshTimeout(Duration),
}

impl FeedError {
    /// Whether repeating the query may succeed. Only refresh failures are
    /// transient; an unknown department never becomes known.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::UnknownDepartment(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::FetchTimeout { .. } | Self::RefreshTimeout(_))
    }
}
