//! User-facing notifications for tool outcomes.
//!
//! Tool implementations only return results; the session dispatch path turns
//! each result into one [`Notification`] here. Front ends subscribe.

use crate::tools::ToolResult;
use serde::Serialize;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn for_tool(tool: &str, result: &ToolResult) -> Self {
        let (level, title) = if result.success {
            (NotificationLevel::Success, format!("{tool} done"))
        } else {
            (NotificationLevel::Error, format!("{tool} failed"))
        };
        Self {
            level,
            title,
            description: result.message.clone(),
        }
    }

    pub fn info(title: &str, description: &str) -> Self {
        Self {
            level: NotificationLevel::Info,
            title: title.to_string(),
            description: description.to_string(),
        }
    }

    pub fn error(title: &str, description: &str) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: title.to_string(),
            description: description.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(64)
    }
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn publish(&self, notification: Notification) {
        tracing::debug!(level = ?notification.level, title = %notification.title, "notification");
        let _ = self.tx.send(notification);
    }

    pub fn tool_result(&self, tool: &str, result: &ToolResult) {
        self.publish(Notification::for_tool(tool, result));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_results_map_to_levels() {
        let notifier = Notifier::default();
        let mut rx = notifier.subscribe();

        notifier.tool_result("nextSlide", &ToolResult::ok("Moved to slide 2."));
        notifier.tool_result("scrapeWebsite", &ToolResult::failure("Could not scrape."));

        let first = rx.try_recv().unwrap();
        assert_eq!(first.level, NotificationLevel::Success);
        assert_eq!(first.description, "Moved to slide 2.");
        let second = rx.try_recv().unwrap();
        assert_eq!(second.level, NotificationLevel::Error);
        assert_eq!(second.title, "scrapeWebsite failed");
    }
}
