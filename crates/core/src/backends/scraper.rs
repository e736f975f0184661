use crate::error::BackendError;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedPage {
    pub markdown: String,
    pub title: Option<String>,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Scraper: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<ScrapedPage, BackendError>;
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<ScrapeData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScrapeData {
    #[serde(default)]
    markdown: Option<String>,
    #[serde(default)]
    metadata: Option<ScrapeMetadata>,
}

#[derive(Debug, Deserialize)]
struct ScrapeMetadata {
    #[serde(default)]
    title: Option<String>,
}

/// Firecrawl's `/v1/scrape` endpoint.
pub struct FirecrawlScraper {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl FirecrawlScraper {
    pub fn new(base_url: &str, api_key: Option<SecretString>, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl Scraper for FirecrawlScraper {
    async fn scrape(&self, url: &str) -> Result<ScrapedPage, BackendError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(BackendError::NotConfigured("the scraping service API key"))?;

        let response = self
            .client
            .post(format!("{}/v1/scrape", self.base_url))
            .bearer_auth(api_key.expose_secret())
            .json(&serde_json::json!({ "url": url, "formats": ["markdown", "html"] }))
            .send()
            .await?;
        let status = response.status();
        let body: ScrapeResponse = match response.json().await {
            Ok(body) => body,
            Err(_) if !status.is_success() => return Err(BackendError::Status(status.as_u16())),
            Err(e) => return Err(BackendError::Malformed(e.to_string())),
        };

        if !status.is_success() || !body.success {
            return Err(match body.error {
                Some(error) => BackendError::Remote(error),
                None => BackendError::Status(status.as_u16()),
            });
        }
        let data = body
            .data
            .ok_or_else(|| BackendError::Malformed("response has no data".to_string()))?;
        let markdown = data
            .markdown
            .ok_or_else(|| BackendError::Malformed("response has no markdown".to_string()))?;
        Ok(ScrapedPage {
            markdown,
            title: data.metadata.and_then(|m| m.title),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn scraper(server: &MockServer, key: Option<&str>) -> FirecrawlScraper {
        FirecrawlScraper::new(
            &server.uri(),
            key.map(|k| SecretString::from(k.to_string())),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn scrapes_markdown() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/scrape"))
            .and(header("authorization", "Bearer fc-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": { "markdown": "# Example", "html": "<h1>Example</h1>", "metadata": { "title": "Example" } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = scraper(&server, Some("fc-test")).scrape("https://example.com").await.unwrap();
        assert_eq!(page.markdown, "# Example");
        assert_eq!(page.title.as_deref(), Some("Example"));
    }

    #[tokio::test]
    async fn reported_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "success": false, "error": "blocked" })),
            )
            .mount(&server)
            .await;

        let err = scraper(&server, Some("fc-test")).scrape("https://example.com").await.unwrap_err();
        assert!(matches!(err, BackendError::Remote(ref m) if m == "blocked"));
    }

    #[tokio::test]
    async fn missing_key_is_not_configured() {
        let server = MockServer::start().await;
        let err = scraper(&server, None).scrape("https://example.com").await.unwrap_err();
        assert!(matches!(err, BackendError::NotConfigured(_)));
    }
}
