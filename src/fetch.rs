use std::collections::BTreeSet;

use chrono::Utc;
use reqwest::Client;
use thiserror::Error;
use url::Url;

use crate::{config::FetchConfig, domain::Entry};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("not a fetchable http(s) url: {0}")]
    InvalidUrl(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("feed parse failed: {0}")]
    Parse(#[from] feed_rs::parser::ParseFeedError),
}

/// Retrieves one subscribed feed and normalizes its entries. Failures stay
/// scoped to the feed that produced them; the sync barrier decides what to
/// do with the result.
pub struct FeedFetcher {
    client: Client,
    config: FetchConfig,
}

impl FeedFetcher {
    pub fn new(client: Client, config: FetchConfig) -> Self {
        Self { client, config }
    }

    pub async fn fetch(&self, raw_url: &str) -> Result<Vec<Entry>, FetchError> {
        let url = match Url::parse(raw_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url,
            _ => return Err(FetchError::InvalidUrl(raw_url.to_string())),
        };

        let response = self
            .client
            .get(url)
            .timeout(self.config.timeout)
            .send()
            .await?
            .error_for_status()?;

        let body = response.bytes().await?;
        let feed = feed_rs::parser::parse(body.as_ref())?;
        Ok(normalize_feed(feed))
    }
}

/// Flattens a parsed feed into the document order the review queue expects.
/// Entries with neither a native id nor a link have no usable identity and
/// are dropped.
pub fn normalize_feed(feed: feed_rs::model::Feed) -> Vec<Entry> {
    feed.entries.into_iter().filter_map(normalize_entry).collect()
}

fn normalize_entry(entry: feed_rs::model::Entry) -> Option<Entry> {
    let link = entry
        .links
        .first()
        .map(|l| l.href.clone())
        .unwrap_or_default();
    let identity = if entry.id.is_empty() {
        link.clone()
    } else {
        entry.id.clone()
    };
    if identity.is_empty() {
        return None;
    }

    let summary = entry.summary.map(|s| s.content).unwrap_or_default();
    let body = entry
        .content
        .and_then(|c| c.body)
        .unwrap_or_else(|| summary.clone());
    let categories: BTreeSet<String> = entry.categories.into_iter().map(|c| c.term).collect();

    Some(Entry {
        identity,
        title: entry.title.map(|t| t.content).unwrap_or_default(),
        link,
        summary,
        body,
        author: entry
            .authors
            .first()
            .map(|a| a.name.clone())
            .unwrap_or_default(),
        categories,
        published: entry
            .published
            .or(entry.updated)
            .unwrap_or_else(Utc::now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS_SAMPLE: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Example Blog</title>
    <item>
      <guid>tag:example.org,2024:post-1</guid>
      <title>First Post</title>
      <link>https://example.org/post-1</link>
      <description>Hello world</description>
      <author>alice@example.org (Alice)</author>
      <category>rust</category>
      <category>async</category>
    </item>
    <item>
      <title>No Guid Post</title>
      <link>https://example.org/post-2</link>
      <description>Fallback identity</description>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn normalizes_rss_entries_in_document_order() {
        let feed = feed_rs::parser::parse(RSS_SAMPLE.as_bytes()).expect("sample parses");
        let entries = normalize_feed(feed);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].identity, "tag:example.org,2024:post-1");
        assert_eq!(entries[0].title, "First Post");
        assert!(entries[0].categories.contains("rust"));
        assert!(entries[0].categories.contains("async"));
    }

    #[test]
    fn guidless_entries_still_get_a_stable_identity() {
        let first = normalize_feed(feed_rs::parser::parse(RSS_SAMPLE.as_bytes()).unwrap());
        let second = normalize_feed(feed_rs::parser::parse(RSS_SAMPLE.as_bytes()).unwrap());
        assert!(!first[1].identity.is_empty());
        assert_eq!(first[1].identity, second[1].identity);
        assert_ne!(first[0].identity, first[1].identity);
        assert_eq!(first[1].body, first[1].summary);
    }
}
