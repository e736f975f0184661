//! Local UI state the tools act on, published as [`UiEffect`]s.
//!
//! The shell is headless: a front end subscribes to the effects and renders
//! them. Navigation is applied synchronously and then announced once.

use crate::navigation::ROOT_ROUTE;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;

/// Routes kept for `back`. Older ones are forgotten.
pub const HISTORY_DEPTH: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum UiEffect {
    Navigate { route: String },
    ThemeChanged { theme: Theme },
    ClipboardWrite { text: String },
    OpenUrl { url: String },
    Confetti { duration_ms: u64 },
    Fullscreen { enabled: bool },
}

#[derive(Debug)]
struct ShellState {
    route: String,
    history: VecDeque<String>,
    theme: Theme,
    clipboard: Option<String>,
}

pub struct AppShell {
    state: Mutex<ShellState>,
    effects: broadcast::Sender<UiEffect>,
}

impl Default for AppShell {
    fn default() -> Self {
        Self::new(64)
    }
}

impl AppShell {
    pub fn new(capacity: usize) -> Self {
        let (effects, _) = broadcast::channel(capacity);
        Self {
            state: Mutex::new(ShellState {
                route: ROOT_ROUTE.to_string(),
                history: VecDeque::new(),
                theme: Theme::default(),
                clipboard: None,
            }),
            effects,
        }
    }

    fn state(&self) -> MutexGuard<'_, ShellState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, effect: UiEffect) {
        tracing::debug!(?effect, "ui effect");
        // No subscriber simply means no front end is attached.
        let _ = self.effects.send(effect);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiEffect> {
        self.effects.subscribe()
    }

    pub fn route(&self) -> String {
        self.state().route.clone()
    }

    pub fn theme(&self) -> Theme {
        self.state().theme
    }

    pub fn clipboard(&self) -> Option<String> {
        self.state().clipboard.clone()
    }

    /// Moves to `route`. Navigating to the current route records nothing
    /// and publishes nothing.
    pub fn navigate(&self, route: &str) {
        {
            let mut state = self.state();
            if state.route == route {
                return;
            }
            let previous = std::mem::replace(&mut state.route, route.to_string());
            if state.history.len() == HISTORY_DEPTH {
                state.history.pop_front();
            }
            state.history.push_back(previous);
        }
        self.publish(UiEffect::Navigate {
            route: route.to_string(),
        });
    }

    /// Returns to the previous route, or the root when there is none.
    pub fn back(&self) -> String {
        let route = {
            let mut state = self.state();
            let route = state.history.pop_back().unwrap_or_else(|| ROOT_ROUTE.to_string());
            state.route = route.clone();
            route
        };
        self.publish(UiEffect::Navigate { route: route.clone() });
        route
    }

    pub fn toggle_theme(&self) -> Theme {
        let theme = {
            let mut state = self.state();
            state.theme = state.theme.toggled();
            state.theme
        };
        self.publish(UiEffect::ThemeChanged { theme });
        theme
    }

    pub fn copy(&self, text: &str) {
        self.state().clipboard = Some(text.to_string());
        self.publish(UiEffect::ClipboardWrite { text: text.to_string() });
    }

    pub fn open_url(&self, url: &str) {
        self.publish(UiEffect::OpenUrl { url: url.to_string() });
    }

    pub fn celebrate(&self, duration: Duration) {
        self.publish(UiEffect::Confetti {
            duration_ms: duration.as_millis() as u64,
        });
    }

    pub fn set_fullscreen(&self, enabled: bool) {
        self.publish(UiEffect::Fullscreen { enabled });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigate_publishes_once_and_records_history() {
        let shell = AppShell::default();
        let mut effects = shell.subscribe();

        shell.navigate("/presentations");
        shell.navigate("/presentations");
        assert_eq!(shell.route(), "/presentations");
        assert_eq!(
            effects.try_recv().unwrap(),
            UiEffect::Navigate {
                route: "/presentations".into()
            }
        );
        assert!(effects.try_recv().is_err());

        shell.navigate("/presentations/voice-demo");
        assert_eq!(shell.back(), "/presentations");
        assert_eq!(shell.back(), "/");
        assert_eq!(shell.back(), "/");
    }

    #[test]
    fn history_is_capped_at_the_most_recent_routes() {
        let shell = AppShell::default();
        for page in 0..HISTORY_DEPTH + 10 {
            shell.navigate(&format!("/page/{page}"));
        }

        let mut visited = Vec::new();
        loop {
            let route = shell.back();
            if route == "/" {
                break;
            }
            visited.push(route);
        }

        assert_eq!(visited.len(), HISTORY_DEPTH);
        assert_eq!(visited[0], format!("/page/{}", HISTORY_DEPTH + 8));
        assert_eq!(visited[HISTORY_DEPTH - 1], "/page/9");
    }

    #[test]
    fn theme_toggles_back_and_forth() {
        let shell = AppShell::default();
        assert_eq!(shell.toggle_theme(), Theme::Dark);
        assert_eq!(shell.toggle_theme(), Theme::Light);
    }

    #[test]
    fn clipboard_keeps_last_copy() {
        let shell = AppShell::default();
        let mut effects = shell.subscribe();
        shell.copy("hello");
        assert_eq!(shell.clipboard().as_deref(), Some("hello"));
        assert_eq!(effects.try_recv().unwrap(), UiEffect::ClipboardWrite { text: "hello".into() });
    }
}
