use crate::audio::Voice;
use crate::tools::Tool;
use crate::Item;

/// Session as echoed back by the server in `session.created` / `session.updated`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SessionResource {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    voice: Option<Voice>,
    #[serde(default)]
    instructions: Option<String>,
    #[serde(default)]
    tools: Vec<Tool>,
}

impl SessionResource {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn voice(&self) -> Option<&Voice> {
        self.voice.as_ref()
    }

    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResponseResource {
    id: String,
    /// "in_progress", "completed", "cancelled", "failed" or "incomplete"
    status: String,
    #[serde(default)]
    status_details: Option<serde_json::Value>,
    #[serde(default)]
    output: Vec<ItemResource>,
    #[serde(default)]
    usage: Option<Usage>,
}

impl ResponseResource {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn status_details(&self) -> Option<&serde_json::Value> {
        self.status_details.as_ref()
    }

    pub fn output(&self) -> &[ItemResource] {
        &self.output
    }

    pub fn usage(&self) -> Option<&Usage> {
        self.usage.as_ref()
    }
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Usage {
    #[serde(default)]
    total_tokens: i32,
    #[serde(default)]
    input_tokens: i32,
    #[serde(default)]
    output_tokens: i32,
}

impl Usage {
    pub fn new(total_tokens: i32, input_tokens: i32, output_tokens: i32) -> Self {
        Self {
            total_tokens,
            input_tokens,
            output_tokens,
        }
    }

    pub fn total_tokens(&self) -> i32 {
        self.total_tokens
    }

    pub fn input_tokens(&self) -> i32 {
        self.input_tokens
    }

    pub fn output_tokens(&self) -> i32 {
        self.output_tokens
    }
}

/// A conversation item as sent by the server. Kept as raw JSON so item
/// types this crate does not model never fail the enclosing event.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ItemResource(serde_json::Value);

impl ItemResource {
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(|v| v.as_str())
    }

    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").and_then(|v| v.as_str())
    }

    pub fn as_item(&self) -> Option<Item> {
        serde_json::from_value(self.0.clone()).ok()
    }

    pub fn raw(&self) -> &serde_json::Value {
        &self.0
    }
}
