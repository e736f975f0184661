use crate::content::message::MessageItem;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum Item {
    #[serde(rename = "message")]
    Message(MessageItem),
    #[serde(rename = "function_call")]
    FunctionCall(FunctionCallItem),
    #[serde(rename = "function_call_output")]
    FunctionCallOutput(FunctionCallOutputItem),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ItemStatus {
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "in_progress")]
    InProgress,
    #[serde(rename = "incomplete")]
    Incomplete,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Completed => "completed",
            ItemStatus::InProgress => "in_progress",
            ItemStatus::Incomplete => "incomplete",
        }
    }
}

/// Fields shared by every conversation item.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub(crate) struct ItemHeader {
    /// The unique ID of the item, optional for client events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FunctionCallItem {
    #[serde(flatten)]
    header: ItemHeader,

    call_id: String,

    name: String,

    /// JSON encoded arguments, as produced by the model
    #[serde(default)]
    arguments: String,
}

impl FunctionCallItem {
    pub fn new(call_id: &str, name: &str, arguments: &str) -> Self {
        Self {
            header: ItemHeader::default(),
            call_id: call_id.to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.header.id.as_deref()
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arguments(&self) -> &str {
        &self.arguments
    }
}

/// Answers a function call. `call_id` must echo the call being answered.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FunctionCallOutputItem {
    #[serde(flatten)]
    header: ItemHeader,

    call_id: String,

    output: String,
}

impl FunctionCallOutputItem {
    pub fn new(call_id: &str, output: &str) -> Self {
        Self {
            header: ItemHeader::default(),
            call_id: call_id.to_string(),
            output: output.to_string(),
        }
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn output(&self) -> &str {
        &self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_call_output_carries_call_id() {
        let item = Item::FunctionCallOutput(FunctionCallOutputItem::new("call_7", r#"{"success":true}"#));
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "function_call_output");
        assert_eq!(value["call_id"], "call_7");
        assert_eq!(value["output"], r#"{"success":true}"#);
        assert!(value.get("id").is_none());
    }

    #[test]
    fn function_call_decodes_from_server_shape() {
        let json = r#"{"id":"item_1","type":"function_call","status":"completed","call_id":"call_1","name":"nextSlide","arguments":"{}"}"#;
        let item: Item = serde_json::from_str(json).unwrap();
        match item {
            Item::FunctionCall(call) => {
                assert_eq!(call.id(), Some("item_1"));
                assert_eq!(call.call_id(), "call_1");
                assert_eq!(call.name(), "nextSlide");
                assert_eq!(call.arguments(), "{}");
            }
            other => panic!("unexpected item {other:?}"),
        }
    }
}
