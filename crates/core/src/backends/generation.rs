use crate::error::BackendError;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Turns a prompt into prose through the content-generation service.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, BackendError>;
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GenerationResponse {
    Content { content: String },
    Error { error: String },
}

pub struct HttpContentGenerator {
    client: Client,
    url: String,
}

impl HttpContentGenerator {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl ContentGenerator for HttpContentGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        tracing::debug!(url = %self.url, "requesting generated content");
        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "prompt": prompt }))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<GenerationResponse>(&body) {
            Ok(GenerationResponse::Content { content }) if status.is_success() => {
                if content.trim().is_empty() {
                    Err(BackendError::Malformed("empty content".to_string()))
                } else {
                    Ok(content)
                }
            }
            Ok(GenerationResponse::Error { error }) => Err(BackendError::Remote(error)),
            _ if !status.is_success() => Err(BackendError::Status(status.as_u16())),
            Ok(GenerationResponse::Content { .. }) => Err(BackendError::Status(status.as_u16())),
            Err(e) => Err(BackendError::Malformed(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn generator(server: &MockServer) -> HttpContentGenerator {
        HttpContentGenerator::new(
            &format!("{}/api/generate-project-content", server.uri()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn returns_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate-project-content"))
            .and(body_json(serde_json::json!({ "prompt": "a pet app" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "content": "Pets!" })))
            .expect(1)
            .mount(&server)
            .await;

        let content = generator(&server).await.generate("a pet app").await.unwrap();
        assert_eq!(content, "Pets!");
    }

    #[tokio::test]
    async fn error_body_is_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({ "error": "Prompt is required" })))
            .mount(&server)
            .await;

        let err = generator(&server).await.generate("").await.unwrap_err();
        assert!(matches!(err, BackendError::Remote(ref m) if m == "Prompt is required"));
    }

    #[tokio::test]
    async fn malformed_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = generator(&server).await.generate("x").await.unwrap_err();
        assert!(matches!(err, BackendError::Malformed(_)));
    }

    #[tokio::test]
    async fn bare_failure_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = generator(&server).await.generate("x").await.unwrap_err();
        assert!(matches!(err, BackendError::Status(502)));
    }
}
