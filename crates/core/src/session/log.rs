use crate::tools::ToolResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(input_tokens: u32, output_tokens: u32, total_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogContent {
    Text {
        text: String,
    },
    Invocation {
        call_id: String,
        name: String,
        arguments: String,
    },
    InvocationResult {
        call_id: String,
        name: String,
        result: ToolResult,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub role: Role,
    pub content: LogContent,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl LogEntry {
    fn new(role: Role, content: LogContent) -> Self {
        Self {
            role,
            content,
            timestamp: Utc::now(),
            usage: None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.content {
            LogContent::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// Conversation record of one session, in arrival order.
///
/// Entries are only ever appended. The one exception is token usage, which
/// the service reports after the reply it belongs to and is filled into that
/// reply's entry once.
#[derive(Debug, Default)]
pub struct MessageLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push(&self, entry: LogEntry) {
        self.lock().push(entry);
    }

    pub fn user_text(&self, text: &str) {
        self.push(LogEntry::new(Role::User, LogContent::Text { text: text.to_string() }));
    }

    pub fn assistant_text(&self, text: &str) {
        self.push(LogEntry::new(
            Role::Assistant,
            LogContent::Text { text: text.to_string() },
        ));
    }

    pub fn invocation(&self, call_id: &str, name: &str, arguments: &str) {
        self.push(LogEntry::new(
            Role::Assistant,
            LogContent::Invocation {
                call_id: call_id.to_string(),
                name: name.to_string(),
                arguments: arguments.to_string(),
            },
        ));
    }

    pub fn invocation_result(&self, call_id: &str, name: &str, result: &ToolResult) {
        self.push(LogEntry::new(
            Role::Tool,
            LogContent::InvocationResult {
                call_id: call_id.to_string(),
                name: name.to_string(),
                result: result.clone(),
            },
        ));
    }

    /// Attaches usage to the latest assistant entry that has none yet.
    /// Returns false when there is no such entry.
    pub fn record_usage(&self, usage: TokenUsage) -> bool {
        let mut entries = self.lock();
        match entries
            .iter_mut()
            .rev()
            .take_while(|entry| entry.usage.is_none())
            .find(|entry| entry.role == Role::Assistant)
        {
            Some(entry) => {
                entry.usage = Some(usage);
                true
            }
            None => false,
        }
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn invocation_count(&self) -> usize {
        self.count(|c| matches!(c, LogContent::Invocation { .. }))
    }

    pub fn result_count(&self) -> usize {
        self.count(|c| matches!(c, LogContent::InvocationResult { .. }))
    }

    fn count(&self, predicate: impl Fn(&LogContent) -> bool) -> usize {
        self.lock().iter().filter(|e| predicate(&e.content)).count()
    }

    /// The result recorded for `call_id`, if it has resolved.
    pub fn result_for(&self, call_id: &str) -> Option<ToolResult> {
        self.lock().iter().find_map(|entry| match &entry.content {
            LogContent::InvocationResult { call_id: id, result, .. } if id == call_id => Some(result.clone()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_keep_arrival_order() {
        let log = MessageLog::new();
        log.user_text("go to slide 3");
        log.invocation("call_1", "goToSlideNumber", r#"{"slideNumber":3}"#);
        log.user_text("and then?");
        log.invocation_result("call_1", "goToSlideNumber", &ToolResult::ok("Moved to slide 3 of 5."));

        let entries = log.entries();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].text(), Some("go to slide 3"));
        assert_eq!(entries[2].text(), Some("and then?"));
        assert_eq!(entries[3].role, Role::Tool);
        assert!(entries.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(log.invocation_count(), 1);
        assert_eq!(log.result_count(), 1);
        assert_eq!(log.result_for("call_1").unwrap().message, "Moved to slide 3 of 5.");
    }

    #[test]
    fn usage_fills_latest_reply_once() {
        let log = MessageLog::new();
        assert!(!log.record_usage(TokenUsage::new(1, 2, 3)));

        log.assistant_text("first");
        log.assistant_text("second");
        assert!(log.record_usage(TokenUsage::new(10, 20, 30)));
        // the newest reply already has usage, older ones are not revisited
        assert!(!log.record_usage(TokenUsage::new(1, 1, 2)));

        let entries = log.entries();
        assert_eq!(entries[0].usage, None);
        assert_eq!(entries[1].usage, Some(TokenUsage::new(10, 20, 30)));
    }

    #[test]
    fn serializes_with_kind_tag() {
        let log = MessageLog::new();
        log.invocation("call_9", "partyMode", "{}");
        let value = serde_json::to_value(&log.entries()[0]).unwrap();
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["content"]["kind"], "invocation");
        assert_eq!(value["content"]["call_id"], "call_9");
        assert!(value.get("usage").is_none());
    }
}
