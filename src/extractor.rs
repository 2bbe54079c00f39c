use crate::config::FetchConfig;
use crate::types::{Result, SummarizerError};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;

/// Fetches an article page and pulls out its readable text.
#[async_trait]
pub trait ArticleExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<String>;
}

pub struct PageExtractor {
    client: Client,
}

impl PageExtractor {
    pub fn new(config: &FetchConfig) -> Self {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }
}

#[async_trait]
impl ArticleExtractor for PageExtractor {
    async fn extract(&self, url: &str) -> Result<String> {
        debug!("Fetching article page: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SummarizerError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

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

        let html = response.text().await.map_err(|e| SummarizerError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let text = extract_text(&html);
        if text.is_empty() {
            return Err(SummarizerError::Parse {
                url: url.to_string(),
                reason: "no article text found".to_string(),
            });
        }

        debug!("Extracted {} characters from {}", text.len(), url);
        Ok(text)
    }
}

/// Collects paragraph text, preferring paragraphs inside an `<article>`
/// element over page-wide ones (navigation, footers).
fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let article_paragraphs = Selector::parse("article p").unwrap();
    let any_paragraphs = Selector::parse("p").unwrap();

    let mut paragraphs: Vec<String> = document
        .select(&article_paragraphs)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    if paragraphs.is_empty() {
        paragraphs = document
            .select(&any_paragraphs)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
    }

    paragraphs.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_article_paragraphs() {
        let html = r#"
            <html><body>
              <nav><p>Home | About</p></nav>
              <article>
                <h1>Headline</h1>
                <p>First paragraph of the story.</p>
                <p>Second paragraph.</p>
              </article>
              <footer><p>Copyright</p></footer>
            </body></html>
        "#;
        let text = extract_text(html);
        assert_eq!(text, "First paragraph of the story.\nSecond paragraph.");
    }

    #[test]
    fn falls_back_to_all_paragraphs() {
        let html = "<html><body><div><p>Loose paragraph.</p></div></body></html>";
        assert_eq!(extract_text(html), "Loose paragraph.");
    }

    #[test]
    fn empty_page_yields_empty_text() {
        assert_eq!(extract_text("<html><body><div>no paras</div></body></html>"), "");
    }
}
