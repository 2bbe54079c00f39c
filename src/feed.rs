use crate::config::FetchConfig;
use crate::types::{Entry, Result, SummarizerError};
use async_trait::async_trait;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use chrono::Utc;
use feed_rs::parser;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Source of feed entries, by URL. The production implementation is
/// [`FeedReader`]; tests substitute canned sources.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetches and parses one feed. Tolerant by contract: an unreachable or
    /// malformed feed yields no entries instead of failing the cycle.
    async fn fetch(&self, url: &str) -> Vec<Entry>;
}

pub struct FeedReader {
    client: Client,
    config: FetchConfig,
}

impl FeedReader {
    pub fn new(config: FetchConfig) -> Self {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    pub async fn try_fetch(&self, url: &str) -> Result<Vec<Entry>> {
        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.config.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.config.retry_delay_seconds),
            max_interval: Duration::from_secs(self.config.retry_delay_seconds * 32),
            multiplier: 2.0,
            ..Default::default()
        };

        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.request(url).await {
                Ok(content) => {
                    debug!("Fetched feed {} ({} bytes)", url, content.len());
                    return Self::parse_entries(&content);
                }
                Err(e) => {
                    last_error = Some(e);
                    if attempt < self.config.max_retries {
                        if let Some(delay) = backoff.next_backoff() {
                            warn!(
                                "Attempt {} failed for {}, retrying in {:?}",
                                attempt + 1,
                                url,
                                delay
                            );
                            tokio::time::sleep(delay).await;
                        }
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| SummarizerError::Fetch {
            url: url.to_string(),
            reason: "unknown error".to_string(),
        }))
    }

    async fn request(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SummarizerError::Fetch {
                url: url.to_string(),
                reason: format!(
                    "HTTP {}: {}",
                    status,
                    status.canonical_reason().unwrap_or("Unknown")
                ),
            });
        }
        Ok(response.text().await?)
    }

    /// Parses RSS/Atom content into entries, in feed-provided order.
    /// Entries without a link carry no identity and are skipped.
    pub fn parse_entries(content: &str) -> Result<Vec<Entry>> {
        let feed = parser::parse(content.as_bytes())
            .map_err(|e| SummarizerError::FeedParse(format!("failed to parse feed: {}", e)))?;

        let entries = feed
            .entries
            .into_iter()
            .filter_map(|entry| {
                let link = entry.links.first()?.href.clone();
                let title = entry
                    .title
                    .map(|t| t.content)
                    .unwrap_or_else(|| "Untitled".to_string());
                let description = entry.summary.map(|s| s.content);
                let published_at = entry.published.map(|dt| dt.with_timezone(&Utc));
                Some(Entry {
                    link,
                    title,
                    description,
                    published_at,
                })
            })
            .collect();

        Ok(entries)
    }
}

#[async_trait]
impl FeedSource for FeedReader {
    async fn fetch(&self, url: &str) -> Vec<Entry> {
        match self.try_fetch(url).await {
            Ok(entries) => {
                debug!("Feed {} yielded {} entries", url, entries.len());
                entries
            }
            Err(e) => {
                warn!("Skipping feed {}: {}", url, e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example News</title>
    <link>https://example.com</link>
    <item>
      <title>First story</title>
      <link>https://example.com/first</link>
      <description>Something happened.</description>
      <pubDate>Mon, 06 Jan 2025 10:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Second story</title>
      <link>https://example.com/second</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parses_rss_items_in_feed_order() {
        let entries = FeedReader::parse_entries(SAMPLE_RSS).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].link, "https://example.com/first");
        assert_eq!(entries[0].title, "First story");
        assert_eq!(entries[0].description.as_deref(), Some("Something happened."));
        assert!(entries[0].published_at.is_some());
        assert_eq!(entries[1].link, "https://example.com/second");
        assert!(entries[1].published_at.is_none());
    }

    #[test]
    fn skips_items_without_links() {
        let xml = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Example</title>
    <item><title>No link here</title></item>
    <item><title>Linked</title><link>https://example.com/linked</link></item>
  </channel>
</rss>"#;
        let entries = FeedReader::parse_entries(xml).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].link, "https://example.com/linked");
    }

    #[test]
    fn malformed_content_is_a_parse_error() {
        let result = FeedReader::parse_entries("this is not a feed");
        assert!(matches!(result, Err(SummarizerError::FeedParse(_))));
    }
}
