//! Content providers, tried in order until one answers.

use crate::config::{ChainOperaConfig, OpenAiChatConfig};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{Value, json};

const SYSTEM_PROMPT: &str = "You are a startup project generator. Generate detailed, professional content \
based on the user's prompt. Focus on creating comprehensive, well-structured responses that are suitable \
for startup documentation.";

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("{0}")]
    NoContent(&'static str),
}

#[async_trait]
pub trait ContentProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        status: status.as_u16(),
        body,
    })
}

pub struct ChainOpera {
    client: Client,
    config: ChainOperaConfig,
}

impl ChainOpera {
    pub fn new(client: Client, config: ChainOperaConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl ContentProvider for ChainOpera {
    fn name(&self) -> &'static str {
        "chainopera"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let body = json!({
            "input_value": prompt,
            "output_type": "chat",
            "input_type": "chat",
            "tweaks": {
                "ChatInput-diz5H": {},
                "Prompt-LAJxw": {},
                "ChatOutput-gEtY2": {},
                "OpenAIModel-AeNjg": {},
            }
        });
        let response = self
            .client
            .post(&self.config.url)
            .header("x-api-key", self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;
        let data: Value = check(response).await?.json().await?;
        tracing::debug!(response = %data, "chainopera response");
        extract_content(&data).ok_or(ProviderError::NoContent("no content in the ChainOpera flow output"))
    }
}

fn text_of(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Pulls the generated text out of a flow run response. The nested flow
/// output wins, then the usual top-level fields, then any string under a
/// key that looks like text.
pub fn extract_content(data: &Value) -> Option<String> {
    flow_output(data)
        .or_else(|| {
            ["output", "response", "content", "text"]
                .iter()
                .find_map(|key| text_of(data.get(*key)))
        })
        .or_else(|| search_text(data))
}

fn flow_output(data: &Value) -> Option<String> {
    let first = data.pointer("/outputs/0/outputs/0")?;
    if let Some(message) = first.pointer("/results/message") {
        return text_of(message.get("text")).or_else(|| text_of(message.pointer("/data/text")));
    }
    let message = first.pointer("/outputs/message")?;
    text_of(message.get("text")).or_else(|| text_of(message.pointer("/message/text")))
}

fn search_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Object(map) => map
            .iter()
            .filter(|(key, _)| {
                let key = key.to_lowercase();
                key.contains("text") || key.contains("content") || key.contains("message")
            })
            .find_map(|(_, value)| search_text(value)),
        _ => None,
    }
}

#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiChat {
    client: Client,
    config: OpenAiChatConfig,
}

impl OpenAiChat {
    pub fn new(client: Client, config: OpenAiChatConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl ContentProvider for OpenAiChat {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
            "max_tokens": 2000,
            "temperature": 0.7,
        });
        let response = self
            .client
            .post(url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;
        let completion: ChatCompletion = check(response).await?.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(ProviderError::NoContent("no content generated"))
    }
}

const TECHNICAL: &str = "## Technical Architecture

**Frontend:**
- A web client with a typed component model
- Voice control over a realtime audio session

**Backend:**
- Stateless HTTP services
- PostgreSQL database
- Redis for caching
- Container-based deployment

**APIs & Integrations:**
- RESTful API design
- Realtime speech model integration
- WebSocket support

**Deployment:**
- CI/CD on every push
- Environment-based configuration";

const PROBLEM: &str = "## Problem Statement

**Current Industry Challenges:**
- Lack of efficient real-time communication tools
- Complex integration processes
- High development costs
- Poor user experience

**How Our Solution Addresses These Issues:**
- Streamlined real-time communication
- Simplified API integrations
- Cost-effective development approach
- Enhanced user experience with modern UI

**Key Benefits:**
- Reduced development time by 60%
- Improved user engagement
- Lower maintenance costs
- Scalable architecture";

const BUSINESS: &str = "## Business Model

**Revenue Streams:**
- Subscription-based pricing
- Enterprise licensing
- API usage fees
- Professional services

**Target Audience:**
- Startups and SMEs
- Enterprise companies
- Developers and agencies
- Educational institutions

**Marketing Strategy:**
- Content marketing
- Developer community engagement
- Partnership programs

**Financial Projections:**
- Year 1: $500K ARR
- Year 2: $2M ARR
- Year 3: $5M ARR";

/// Canned content picked by prompt keywords. Used when no provider is
/// configured or every provider failed.
pub fn mock_content(prompt: &str) -> String {
    let lower = prompt.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|word| lower.contains(word));

    if mentions(&["technical", "architecture", "technology"]) {
        TECHNICAL.to_string()
    } else if mentions(&["problem", "solve", "challenge"]) {
        PROBLEM.to_string()
    } else if mentions(&["business", "revenue", "model"]) {
        BUSINESS.to_string()
    } else {
        format!(
            "## Generated Content

Based on your request: \"{prompt}\"

This response covers the technical, problem and business sides of your project.

**Key Features:**
- Modern technology stack
- Scalable architecture
- User-friendly interface

**Implementation Plan:**
- Phase 1: Core development
- Phase 2: Testing and optimization
- Phase 3: Launch and marketing
- Phase 4: Growth and expansion"
        )
    }
}
