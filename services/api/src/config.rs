use secrecy::SecretString;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_CHAINOPERA_URL: &str =
    "https://agent.chainopera.ai/api/v1/run/5b92e4e3-f764-4789-88ce-62562b632a99?stream=false";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Clone, Debug)]
pub struct ChainOperaConfig {
    pub url: String,
    pub api_key: SecretString,
}

#[derive(Clone, Debug)]
pub struct OpenAiChatConfig {
    pub base_url: String,
    pub api_key: SecretString,
    pub model: String,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// Set when `CHAINOPERA_API_KEY` is present.
    pub chainopera: Option<ChainOperaConfig>,
    /// Set when `OPENAI_API_KEY` is present.
    pub openai: Option<OpenAiChatConfig>,
    pub request_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// This function will look for a `.env` file in the current directory
    /// and load the following variables:
    ///
    /// *   `BIND_ADDRESS`: The address and port to bind the server to. Defaults to "0.0.0.0:3000".
    /// *   `CHAINOPERA_API_KEY`: (Optional) Enables the ChainOpera flow provider.
    /// *   `CHAINOPERA_API_URL`: (Optional) Overrides the ChainOpera flow endpoint.
    /// *   `OPENAI_API_KEY`: (Optional) Enables the OpenAI chat provider.
    /// *   `OPENAI_BASE_URL`: (Optional) Defaults to "https://api.openai.com/v1".
    /// *   `CHAT_MODEL`: (Optional) Defaults to "gpt-4o-mini".
    /// *   `REQUEST_TIMEOUT_SECS`: (Optional) Per-provider budget. Defaults to 60.
    ///
    /// With neither key set every request is answered from the built-in mock content.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let bind_address_str = env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let chainopera = non_empty_var("CHAINOPERA_API_KEY").map(|key| ChainOperaConfig {
            url: non_empty_var("CHAINOPERA_API_URL").unwrap_or_else(|| DEFAULT_CHAINOPERA_URL.to_string()),
            api_key: SecretString::from(key),
        });

        let openai = non_empty_var("OPENAI_API_KEY").map(|key| OpenAiChatConfig {
            base_url: non_empty_var("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            api_key: SecretString::from(key),
            model: non_empty_var("CHAT_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
        });

        let timeout_str = env::var("REQUEST_TIMEOUT_SECS").unwrap_or_else(|_| "60".to_string());
        let request_timeout = timeout_str
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidValue("REQUEST_TIMEOUT_SECS".to_string(), e.to_string()))?;

        Ok(Self {
            bind_address,
            chainopera,
            openai,
            request_timeout,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
