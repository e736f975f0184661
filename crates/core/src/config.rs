use openai_realtime_types::audio::Voice;
use secrecy::SecretString;
use std::time::Duration;

pub const DEFAULT_INSTRUCTIONS: &str = "You are a friendly voice assistant for a startup presentation site. \
Keep spoken replies short. Use the available tools to navigate pages, control the presentation, \
scrape websites and generate content whenever the user asks for it, and tell the user what happened.";

/// Session manager tunables.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub voice: Voice,
    pub instructions: String,
    /// Connect attempts made before giving up with `Error`.
    pub max_connect_attempts: u32,
    pub reconnect_delay: Duration,
    /// Budget for each connect attempt and for the server's ready signal.
    pub ready_timeout: Duration,
    /// How long `stop` waits for in-flight invocations to report back.
    pub flush_timeout: Duration,
    pub channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            voice: Voice::default(),
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            max_connect_attempts: 3,
            reconnect_delay: Duration::from_secs(1),
            ready_timeout: Duration::from_secs(15),
            flush_timeout: Duration::from_secs(2),
            channel_capacity: 1024,
        }
    }
}

/// Reading-rate model for slide narration.
#[derive(Debug, Clone)]
pub struct NarrationConfig {
    pub seconds_per_word: f64,
    pub minimum: Duration,
    /// Pause after the estimated reading time before the deck may move on.
    pub settle: Duration,
    pub advance_pause: Duration,
    /// Added to a pending advance by `extendSlideTime`.
    pub extension: Duration,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            seconds_per_word: 0.4,
            minimum: Duration::from_secs(10),
            settle: Duration::from_secs(3),
            advance_pause: Duration::from_secs(2),
            extension: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub generation_url: String,
    pub firecrawl_api_key: Option<SecretString>,
    pub firecrawl_base_url: String,
    /// Per-call budget for the network-backed tools.
    pub tool_timeout: Duration,
    /// Scraped markdown is cut to this many characters before reaching the model.
    pub max_scrape_chars: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            generation_url: "http://localhost:3000/api/generate-project-content".to_string(),
            firecrawl_api_key: None,
            firecrawl_base_url: "https://api.firecrawl.dev".to_string(),
            tool_timeout: Duration::from_secs(30),
            max_scrape_chars: 6000,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CoreConfig {
    pub session: SessionConfig,
    pub narration: NarrationConfig,
    pub backend: BackendConfig,
}
