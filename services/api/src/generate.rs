use crate::config::Config;
use crate::providers::{ChainOpera, ContentProvider, OpenAiChat, mock_content};
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const GENERATE_ROUTE: &str = "/api/generate-project-content";

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum GenerateResponse {
    Content { content: String },
    Error { error: String },
}

#[derive(Clone)]
pub struct AppState {
    providers: Arc<Vec<Box<dyn ContentProvider>>>,
}

impl AppState {
    pub fn new(providers: Vec<Box<dyn ContentProvider>>) -> Self {
        Self {
            providers: Arc::new(providers),
        }
    }

    /// Providers in the order they are tried: ChainOpera, then OpenAI chat.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(config.request_timeout).build()?;
        let mut providers: Vec<Box<dyn ContentProvider>> = Vec::new();
        if let Some(chainopera) = &config.chainopera {
            providers.push(Box::new(ChainOpera::new(client.clone(), chainopera.clone())));
        }
        if let Some(openai) = &config.openai {
            providers.push(Box::new(OpenAiChat::new(client, openai.clone())));
        }
        Ok(Self::new(providers))
    }

    pub async fn generate(&self, prompt: &str) -> String {
        for provider in self.providers.iter() {
            match provider.generate(prompt).await {
                Ok(content) => {
                    tracing::info!(provider = provider.name(), chars = content.len(), "content generated");
                    return content;
                }
                Err(e) => {
                    tracing::error!(provider = provider.name(), "generation failed, trying the next provider: {}", e);
                }
            }
        }
        tracing::info!("answering with mock content");
        mock_content(prompt)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new().route(GENERATE_ROUTE, post(generate_project_content)).with_state(state)
}

fn bad_request(error: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(GenerateResponse::Error { error })).into_response()
}

pub async fn generate_project_content(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::warn!("rejected generation request: {}", rejection.body_text());
            return bad_request(format!("Invalid request body: {}", rejection.body_text()));
        }
    };
    let Some(prompt) = request.prompt.filter(|prompt| !prompt.trim().is_empty()) else {
        return bad_request("Prompt is required".to_string());
    };
    let content = state.generate(&prompt).await;
    Json(GenerateResponse::Content { content }).into_response()
}
