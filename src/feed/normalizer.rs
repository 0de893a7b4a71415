use atom_syndication::{Entry, Feed};

use super::{FeedItem, NormalizedFeed};

#[derive(Debug, thiserror::Error)]
#[error("malformed atom document: {0}")]
pub struct ParseError(#[from] atom_syndication::Error);

/// Parse an Atom document into its entries.
///
/// Only the fields of [`FeedItem`] are kept. Feed-level metadata, categories,
/// authors and any extension elements are dropped.
pub fn normalize(raw: &[u8]) -> Result<NormalizedFeed, ParseError> {
    let feed = Feed::read_from(raw)?;

    Ok(NormalizedFeed(feed.entries().iter().map(to_item).collect()))
}

fn to_item(entry: &Entry) -> FeedItem {
    FeedItem {
        id: entry.id().to_string(),
        title: entry.title().value.trim().to_string(),
        link: entry_link(entry),
        published: entry.published().copied(),
        updated: *entry.updated(),
        summary: entry.summary().map(|s| s.value.trim().to_string()),
    }
}

fn entry_link(entry: &Entry) -> String {
    let links = entry.links();

    links
        .iter()
        .find(|l| l.rel() == "alternate")
        .or_else(|| links.first())
        .map(|l| l.href().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOV_UK_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xml:lang="en-GB">
  <id>https://www.gov.uk/government/organisations/hm-treasury</id>
  <link rel="self" type="application/atom+xml" href="https://www.gov.uk/government/organisations/hm-treasury.atom"/>
  <title>HM Treasury - Activity on GOV.UK</title>
  <updated>2024-05-02T10:15:00+01:00</updated>
  <entry>
    <id>https://www.gov.uk/government/news/spring-budget</id>
    <updated>2024-05-02T10:15:00+01:00</updated>
    <link rel="alternate" type="text/html" href="https://www.gov.uk/government/news/spring-budget"/>
    <title>Spring Budget</title>
    <summary type="html">Chancellor sets out the  budget.</summary>
    <category term="news"/>
  </entry>
  <entry>
    <id>https://www.gov.uk/government/publications/tax-tables</id>
    <updated>2024-04-30T09:00:00+01:00</updated>
    <published>2024-04-29T08:30:00+01:00</published>
    <link rel="related" href="https://example.org/related"/>
    <title>
      Tax tables
    </title>
  </entry>
</feed>"#;

    #[test]
    fn keeps_entries_in_document_order() {
        let feed = normalize(GOV_UK_SAMPLE.as_bytes()).unwrap();

        assert_eq!(feed.len(), 2);

        let first = &feed.items()[0];
        assert_eq!(first.id, "https://www.gov.uk/government/news/spring-budget");
        assert_eq!(first.title, "Spring Budget");
        assert_eq!(first.link, "https://www.gov.uk/government/news/spring-budget");
        assert_eq!(first.updated.to_rfc3339(), "2024-05-02T10:15:00+01:00");
        assert_eq!(first.published, None);
        assert_eq!(first.summary.as_deref(), Some("Chancellor sets out the  budget."));

        let second = &feed.items()[1];
        assert_eq!(second.title, "Tax tables");
        assert_eq!(second.link, "https://example.org/related");
        assert_eq!(
            second.published.map(|p| p.to_rfc3339()).as_deref(),
            Some("2024-04-29T08:30:00+01:00")
        );
        assert_eq!(second.summary, None);
    }

    #[test]
    fn empty_feed_has_no_items() {
        let raw = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <id>urn:empty</id>
  <title>Nothing yet</title>
  <updated>2024-01-01T00:00:00Z</updated>
</feed>"#;

        let feed = normalize(raw.as_bytes()).unwrap();
        assert!(feed.is_empty());
    }

    #[test]
    fn is_deterministic() {
        let a = normalize(GOV_UK_SAMPLE.as_bytes()).unwrap();
        let b = normalize(GOV_UK_SAMPLE.as_bytes()).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn rejects_non_atom_documents() {
        assert!(normalize(b"<html><body>maintenance</body></html>").is_err());
        assert!(normalize(b"").is_err());
    }

    #[test]
    fn serializes_as_plain_array() {
        let feed = normalize(GOV_UK_SAMPLE.as_bytes()).unwrap();
        let json = serde_json::to_value(&feed).unwrap();

        let items = json.as_array().expect("feed serializes as an array");
        assert_eq!(items[0]["title"], "Spring Budget");
        assert_eq!(items[0]["updated"], "2024-05-02T10:15:00+01:00");
        assert!(items[0].get("published").is_none());
    }
}
