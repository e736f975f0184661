use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome of one tool invocation. `message` is read by the speech model, so
/// it is always plain prose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl ToolResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Map::new(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: Map::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// JSON text sent back to the model as the function output.
    pub fn to_output(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"success":{},"message":{:?}}}"#, self.success, self.message)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_fields_are_flattened() {
        let result = ToolResult::ok("It is noon.").with_field("time", "12:00");
        let value: Value = serde_json::from_str(&result.to_output()).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["message"], "It is noon.");
        assert_eq!(value["time"], "12:00");
    }
}
