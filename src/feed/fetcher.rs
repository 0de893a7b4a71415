use std::time::Duration;

use anyhow::Context as _;
use bytes::Bytes;
use hyper::StatusCode;

use crate::departments::Department;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("upstream returned {0}")]
    Status(StatusCode),
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Request(e) if e.is_timeout())
    }
}

/// Retrieves the raw feed document of one department.
#[async_trait::async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, department: &Department) -> Result<Bytes, FetchError>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFetcher {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("http client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn feed_url(&self, department: &Department) -> String {
        format!("{}/{}.atom", self.base_url, department.slug)
    }
}

#[async_trait::async_trait]
impl FeedFetcher for HttpFetcher {
    #[tracing::instrument(skip_all, fields(department = %department.id))]
    async fn fetch(&self, department: &Department) -> Result<Bytes, FetchError> {
        let url = self.feed_url(department);
        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "feed request rejected");
            return Err(FetchError::Status(status));
        }

        let body = resp.bytes().await?;
        tracing::debug!(%url, bytes = body.len(), "fetched feed");

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn fetcher(server: &MockServer) -> HttpFetcher {
        HttpFetcher::new(
            &format!("{}/government/organisations/", server.uri()),
            "govreader-test",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn treasury() -> Department {
        Department::new("HMT", "hm-treasury", "HM Treasury", "#af292e")
    }

    #[test]
    fn builds_atom_url_from_slug() {
        let fetcher = HttpFetcher::new(
            "https://www.gov.uk/government/organisations/",
            "govreader-test",
            Duration::from_secs(1),
        )
        .unwrap();

        assert_eq!(
            fetcher.feed_url(&treasury()),
            "https://www.gov.uk/government/organisations/hm-treasury.atom"
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn returns_body_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/government/organisations/hm-treasury.atom"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<feed/>"))
            .expect(1)
            .mount(&server)
            .await;

        let body = fetcher(&server).fetch(&treasury()).await.unwrap();
        assert_eq!(&body[..], b"<feed/>");
    }

    #[tokio::test]
    #[traced_test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = fetcher(&server).fetch(&treasury()).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(s) if s == StatusCode::SERVICE_UNAVAILABLE));
    }

    #[tokio::test]
    #[traced_test]
    async fn slow_upstream_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&server.uri(), "govreader-test", Duration::from_millis(100)).unwrap();
        let err = fetcher.fetch(&treasury()).await.unwrap_err();

        assert!(err.is_timeout());
    }
}
