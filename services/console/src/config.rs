//! Console configuration.
//!
//! Everything comes from environment variables (a `.env` file is honoured)
//! and lands in the core's typed config structs.

use openai_realtime::types::audio::Voice;
use secrecy::SecretString;
use std::env;
use std::time::Duration;
use voicedeck_core::config::CoreConfig;
use voicedeck_core::error::CatalogError;
use voicedeck_core::tools::ToolCatalog;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
    #[error("Invalid TOOLS list: {0}")]
    Catalog(#[from] CatalogError),
}

pub struct Config {
    pub core: CoreConfig,
    pub realtime: openai_realtime::Config,
    pub catalog: ToolCatalog,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// *   `OPENAI_API_KEY`: Required.
    /// *   `REALTIME_MODEL`, `REALTIME_BASE_URL`: (Optional) Realtime endpoint overrides.
    /// *   `VOICE`: (Optional) Voice profile. Defaults to "ash".
    /// *   `GENERATION_URL`: (Optional) The content-generation endpoint.
    /// *   `FIRECRAWL_API_KEY`, `FIRECRAWL_BASE_URL`: (Optional) Scraping service.
    /// *   `TOOL_TIMEOUT_SECS`: (Optional) Budget for network tools. Defaults to 30.
    /// *   `MAX_CONNECT_ATTEMPTS`: (Optional) Defaults to 3.
    /// *   `TOOLS`: (Optional) Comma-separated tool names. Defaults to every tool.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_key = var("OPENAI_API_KEY").ok_or_else(|| ConfigError::MissingVar("OPENAI_API_KEY".to_string()))?;
        let mut realtime = openai_realtime::Config::builder().with_api_key(SecretString::from(api_key));
        if let Some(model) = var("REALTIME_MODEL") {
            realtime = realtime.with_model(&model);
        }
        if let Some(base_url) = var("REALTIME_BASE_URL") {
            realtime = realtime.with_base_url(&base_url);
        }

        let mut core = CoreConfig::default();
        if let Some(voice) = var("VOICE") {
            core.session.voice = voice.parse::<Voice>().unwrap_or_else(|never| match never {});
        }
        if let Some(attempts) = var("MAX_CONNECT_ATTEMPTS") {
            core.session.max_connect_attempts = parse("MAX_CONNECT_ATTEMPTS", &attempts)?;
        }
        if let Some(url) = var("GENERATION_URL") {
            core.backend.generation_url = url;
        }
        core.backend.firecrawl_api_key = var("FIRECRAWL_API_KEY").map(SecretString::from);
        if let Some(base_url) = var("FIRECRAWL_BASE_URL") {
            core.backend.firecrawl_base_url = base_url;
        }
        if let Some(secs) = var("TOOL_TIMEOUT_SECS") {
            core.backend.tool_timeout = Duration::from_secs(parse("TOOL_TIMEOUT_SECS", &secs)?);
        }

        let catalog = match var("TOOLS") {
            Some(list) => ToolCatalog::from_names(list.split(',').filter(|name| !name.trim().is_empty()))?,
            None => ToolCatalog::standard(),
        };

        Ok(Self {
            core,
            realtime: realtime.build(),
            catalog,
        })
    }
}

fn parse<T>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_need_only_the_api_key() {
        let config = load(&[("OPENAI_API_KEY", "sk-test")]).unwrap();
        assert_eq!(config.core.session.voice, Voice::Ash);
        assert_eq!(config.core.session.max_connect_attempts, 3);
        assert_eq!(config.core.backend.tool_timeout, Duration::from_secs(30));
        assert!(config.core.backend.firecrawl_api_key.is_none());
        assert_eq!(config.catalog.len(), 19);
    }

    #[test]
    fn missing_api_key_is_an_error() {
        assert!(matches!(load(&[]), Err(ConfigError::MissingVar(_))));
    }

    #[test]
    fn overrides_are_applied() {
        let config = load(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("VOICE", "Coral"),
            ("TOOL_TIMEOUT_SECS", "5"),
            ("MAX_CONNECT_ATTEMPTS", "1"),
            ("REALTIME_BASE_URL", "ws://localhost:9000/v1/"),
            ("TOOLS", "nextSlide, previousSlide"),
        ])
        .unwrap();
        assert_eq!(config.core.session.voice, Voice::Coral);
        assert_eq!(config.core.backend.tool_timeout, Duration::from_secs(5));
        assert_eq!(config.core.session.max_connect_attempts, 1);
        assert_eq!(config.realtime.base_url(), "ws://localhost:9000/v1");
        assert_eq!(config.catalog.len(), 2);
    }

    #[test]
    fn bad_values_are_rejected() {
        let err = load(&[("OPENAI_API_KEY", "sk-test"), ("TOOL_TIMEOUT_SECS", "soon")]);
        assert!(matches!(err, Err(ConfigError::InvalidValue(name, _)) if name == "TOOL_TIMEOUT_SECS"));

        let err = load(&[("OPENAI_API_KEY", "sk-test"), ("TOOLS", "nextSlide,takeScreenshot")]);
        assert!(matches!(err, Err(ConfigError::Catalog(_))));
    }
}
