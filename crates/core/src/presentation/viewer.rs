use crate::bridge::{PresentationBridge, PresentationControls};
use crate::config::NarrationConfig;
use crate::error::SessionError;
use crate::presentation::deck::Presentation;
use crate::presentation::narration;
use crate::registry::RegistrationHandle;
use crate::shell::AppShell;
use crate::tools::ToolResult;
#[cfg(test)]
use mockall::automock;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Where narration text goes: the live voice session.
#[cfg_attr(test, automock)]
pub trait NarrationSink: Send + Sync {
    fn is_active(&self) -> bool;
    fn send_narration(&self, text: &str) -> Result<(), SessionError>;
}

/// A scheduled automatic advance away from `slide`.
struct AdvanceTimer {
    token: CancellationToken,
    deadline: Instant,
    slide: usize,
    seq: u64,
}

struct ViewerState {
    deck: Presentation,
    current: usize,
    paused: bool,
    auto_narrate: bool,
    fullscreen: bool,
    timer: Option<AdvanceTimer>,
    next_seq: u64,
}

impl ViewerState {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.token.cancel();
        }
    }

    fn is_last(&self, index: usize) -> bool {
        index + 1 >= self.deck.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerSnapshot {
    pub presentation_id: String,
    /// 0-based
    pub current: usize,
    pub total: usize,
    pub paused: bool,
    pub fullscreen: bool,
    pub advance_pending: bool,
}

/// Presentation state for one mounted deck.
///
/// Every slide change, manual or automatic, narrates the new slide when
/// auto-narration is on and a voice session is active. Narrating schedules an
/// advance after the estimated reading time; the advance is cancelled by
/// manual navigation, pausing and dropping the viewer, and it re-checks its
/// sequence number when it fires so a superseded timer never moves the deck.
pub struct PresentationViewer {
    state: Mutex<ViewerState>,
    sink: Arc<dyn NarrationSink>,
    shell: Arc<AppShell>,
    config: NarrationConfig,
    me: Weak<PresentationViewer>,
}

impl PresentationViewer {
    pub fn new(
        deck: Presentation,
        sink: Arc<dyn NarrationSink>,
        shell: Arc<AppShell>,
        config: NarrationConfig,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            state: Mutex::new(ViewerState {
                deck,
                current: 0,
                paused: false,
                auto_narrate: true,
                fullscreen: false,
                timer: None,
                next_seq: 0,
            }),
            sink,
            shell,
            config,
            me: me.clone(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, ViewerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> ViewerSnapshot {
        let state = self.lock();
        ViewerSnapshot {
            presentation_id: state.deck.id.clone(),
            current: state.current,
            total: state.deck.len(),
            paused: state.paused,
            fullscreen: state.fullscreen,
            advance_pending: state.timer.is_some(),
        }
    }

    pub fn presentation_id(&self) -> String {
        self.lock().deck.id.clone()
    }

    pub fn set_auto_narrate(&self, enabled: bool) {
        let mut state = self.lock();
        state.auto_narrate = enabled;
        if !enabled {
            state.cancel_timer();
        }
    }

    /// Swaps in another deck. A different id starts again at the first slide.
    pub fn load(&self, deck: Presentation) -> bool {
        let mut state = self.lock();
        if state.deck.id == deck.id {
            return false;
        }
        tracing::info!(from = %state.deck.id, to = %deck.id, "loading presentation");
        state.cancel_timer();
        state.deck = deck;
        state.current = 0;
        state.paused = false;
        true
    }

    /// Cancels any pending advance. Called on unmount.
    pub fn shutdown(&self) {
        self.lock().cancel_timer();
    }

    fn schedule(&self, state: &mut ViewerState, slide: usize, delay: Duration) {
        state.cancel_timer();
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no async runtime, slide will not auto-advance");
            return;
        };
        state.next_seq += 1;
        let seq = state.next_seq;
        let token = CancellationToken::new();
        let deadline = Instant::now() + delay;
        state.timer = Some(AdvanceTimer {
            token: token.clone(),
            deadline,
            slide,
            seq,
        });
        tracing::debug!(slide = slide + 1, ?delay, seq, "auto-advance scheduled");

        let viewer = self.me.clone();
        runtime.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep_until(deadline) => {
                    if let Some(viewer) = viewer.upgrade() {
                        viewer.on_timer(seq);
                    }
                }
            }
        });
    }

    fn on_timer(&self, seq: u64) {
        let next = {
            let mut state = self.lock();
            if state.timer.as_ref().map(|t| t.seq) != Some(seq) {
                return;
            }
            let Some(timer) = state.timer.take() else {
                return;
            };
            if state.paused || state.current != timer.slide || state.is_last(timer.slide) {
                return;
            }
            state.current = timer.slide + 1;
            state.current
        };
        tracing::info!(slide = next + 1, "auto-advanced");
        self.narrate_if_enabled(next);
    }

    fn narrate_if_enabled(&self, index: usize) {
        if self.lock().auto_narrate && self.sink.is_active() {
            let result = self.start_narration(index);
            if !result.success {
                tracing::info!("auto-narration skipped: {}", result.message);
            }
        }
    }

    /// Sends the slide's text to the session and schedules the advance.
    fn start_narration(&self, index: usize) -> ToolResult {
        let (text, title) = {
            let state = self.lock();
            match state.deck.slide(index) {
                Some(slide) => (slide.narration_text(), slide.title.clone()),
                None => return ToolResult::failure(format!("Slide {} doesn't exist.", index + 1)),
            }
        };
        if !self.sink.is_active() {
            return ToolResult::failure("Start a voice session first so I can narrate the slides.");
        }
        if let Err(e) = self.sink.send_narration(&text) {
            tracing::warn!("narration not sent: {}", e);
            return ToolResult::failure("The narration couldn't be sent to the voice session.");
        }

        let mut state = self.lock();
        if state.current == index && !state.paused && !state.is_last(index) {
            let delay = narration::advance_delay(&text, &self.config);
            self.schedule(&mut state, index, delay);
        }
        ToolResult::ok(format!("Narrating slide {}: {title}.", index + 1)).with_field("slide", index + 1)
    }

    fn change_slide(&self, target: usize) -> ToolResult {
        let (changed, total, title) = {
            let mut state = self.lock();
            let changed = state.current != target;
            if changed {
                state.cancel_timer();
                state.current = target;
            }
            let title = state.deck.slide(target).map(|s| s.title.clone()).unwrap_or_default();
            (changed, state.deck.len(), title)
        };
        if !changed {
            return ToolResult::ok(format!("Already on slide {} of {total}.", target + 1))
                .with_field("slide", target + 1)
                .with_field("changed", false);
        }
        tracing::debug!(slide = target + 1, "slide changed");
        self.narrate_if_enabled(target);
        ToolResult::ok(format!("Moved to slide {} of {total}: {title}.", target + 1)).with_field("slide", target + 1)
    }
}

impl PresentationControls for PresentationViewer {
    fn next_slide(&self) -> ToolResult {
        let (current, last) = {
            let state = self.lock();
            (state.current, state.is_last(state.current))
        };
        if last {
            return ToolResult::ok("Already on the last slide.").with_field("changed", false);
        }
        self.change_slide(current + 1)
    }

    fn previous_slide(&self) -> ToolResult {
        let current = self.lock().current;
        if current == 0 {
            return ToolResult::ok("Already on the first slide.").with_field("changed", false);
        }
        self.change_slide(current - 1)
    }

    fn go_to_slide(&self, number: usize) -> ToolResult {
        let total = self.lock().deck.len();
        if number == 0 || number > total {
            return ToolResult::failure(format!(
                "Slide {number} doesn't exist. This presentation has slides 1 to {total}."
            ))
            .with_field("total", total);
        }
        self.change_slide(number - 1)
    }

    fn first_slide(&self) -> ToolResult {
        self.go_to_slide(1)
    }

    fn last_slide(&self) -> ToolResult {
        let total = self.lock().deck.len();
        self.go_to_slide(total)
    }

    fn toggle_pause(&self) -> ToolResult {
        let mut state = self.lock();
        state.paused = !state.paused;
        if state.paused {
            state.cancel_timer();
            return ToolResult::ok("Presentation paused. Slides will not advance automatically.").with_field("paused", true);
        }
        // The current slide has already been read, so only the pauses remain.
        let current = state.current;
        if state.auto_narrate && !state.is_last(current) && self.sink.is_active() {
            let delay = self.config.settle + self.config.advance_pause;
            self.schedule(&mut state, current, delay);
        }
        ToolResult::ok("Presentation resumed. Slides will advance after narration.").with_field("paused", false)
    }

    fn toggle_fullscreen(&self) -> ToolResult {
        let enabled = {
            let mut state = self.lock();
            state.fullscreen = !state.fullscreen;
            state.fullscreen
        };
        self.shell.set_fullscreen(enabled);
        let message = if enabled { "Entered fullscreen mode." } else { "Exited fullscreen mode." };
        ToolResult::ok(message).with_field("fullscreen", enabled)
    }

    fn exit(&self) -> ToolResult {
        let was_fullscreen = {
            let mut state = self.lock();
            state.cancel_timer();
            std::mem::replace(&mut state.fullscreen, false)
        };
        if was_fullscreen {
            self.shell.set_fullscreen(false);
        }
        let route = self.shell.back();
        ToolResult::ok("Exited the presentation.").with_field("route", route)
    }

    fn reset(&self) -> ToolResult {
        {
            let mut state = self.lock();
            state.cancel_timer();
            state.current = 0;
            state.paused = false;
        }
        self.narrate_if_enabled(0);
        ToolResult::ok("Presentation reset to slide 1 and auto-play is on.").with_field("slide", 1)
    }

    fn narrate(&self, number: Option<usize>) -> ToolResult {
        let (index, total) = {
            let state = self.lock();
            (number.map(|n| n.saturating_sub(1)).unwrap_or(state.current), state.deck.len())
        };
        if number == Some(0) || index >= total {
            return ToolResult::failure(format!(
                "Slide {} doesn't exist. This presentation has slides 1 to {total}.",
                number.unwrap_or(index + 1)
            ));
        }
        self.start_narration(index)
    }

    fn extend_current_slide_timing(&self) -> ToolResult {
        let mut state = self.lock();
        let Some(timer) = state.timer.take() else {
            return ToolResult::failure("No automatic slide change is pending, so there is nothing to extend.");
        };
        timer.token.cancel();
        let remaining = timer.deadline.saturating_duration_since(Instant::now()) + self.config.extension;
        let slide = timer.slide;
        self.schedule(&mut state, slide, remaining);
        ToolResult::ok(format!(
            "Added {} more seconds to slide {}.",
            self.config.extension.as_secs(),
            slide + 1
        ))
    }

    fn current_slide(&self) -> usize {
        self.lock().current + 1
    }
}

impl Drop for PresentationViewer {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(|e| e.into_inner());
        state.cancel_timer();
    }
}

/// A viewer that is on screen: registered with the bridge until dropped.
pub struct MountedPresentation {
    viewer: Arc<PresentationViewer>,
    bridge: PresentationBridge,
    handle: Option<RegistrationHandle>,
}

impl MountedPresentation {
    pub fn mount(bridge: &PresentationBridge, viewer: Arc<PresentationViewer>) -> Self {
        let controls: Arc<dyn PresentationControls> = viewer.clone();
        let handle = bridge.attach(&controls);
        tracing::info!(presentation = %viewer.presentation_id(), "presentation mounted");
        Self {
            viewer,
            bridge: bridge.clone(),
            handle: Some(handle),
        }
    }

    pub fn viewer(&self) -> &Arc<PresentationViewer> {
        &self.viewer
    }

    pub fn load(&self, deck: Presentation) -> bool {
        self.viewer.load(deck)
    }
}

impl Drop for MountedPresentation {
    fn drop(&mut self) {
        self.viewer.shutdown();
        if let Some(handle) = self.handle.take() {
            self.bridge.detach(handle);
        }
        tracing::info!(presentation = %self.viewer.presentation_id(), "presentation unmounted");
    }
}
