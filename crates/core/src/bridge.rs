//! Presentation control routed through the capability registry.
//!
//! Whatever viewer is on screen attaches itself here; tool implementations
//! call the bridge and never hold a viewer directly.

use crate::error::CapabilityError;
use crate::registry::{CapabilityRegistry, CapabilitySet, RegistrationHandle};
use crate::tools::ToolResult;
#[cfg(test)]
use mockall::automock;
use serde_json::{json, Value};
use std::sync::{Arc, Weak};

pub const PRESENTATION_AREA: &str = "presentation";

pub const NO_PRESENTATION: &str =
    "There's no active presentation on screen right now. Ask me to open the presentations page first.";

/// Operations a mounted presentation viewer provides. Slide numbers are 1-based.
#[cfg_attr(test, automock)]
pub trait PresentationControls: Send + Sync {
    fn next_slide(&self) -> ToolResult;
    fn previous_slide(&self) -> ToolResult;
    fn go_to_slide(&self, number: usize) -> ToolResult;
    fn first_slide(&self) -> ToolResult;
    fn last_slide(&self) -> ToolResult;
    fn toggle_pause(&self) -> ToolResult;
    fn toggle_fullscreen(&self) -> ToolResult;
    fn exit(&self) -> ToolResult;
    fn reset(&self) -> ToolResult;
    fn narrate(&self, number: Option<usize>) -> ToolResult;
    fn extend_current_slide_timing(&self) -> ToolResult;
    fn current_slide(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationOp {
    Next,
    Previous,
    GoTo,
    First,
    Last,
    TogglePause,
    ToggleFullscreen,
    Exit,
    Reset,
    Narrate,
    ExtendTiming,
    CurrentSlide,
}

impl PresentationOp {
    pub const ALL: [PresentationOp; 12] = [
        PresentationOp::Next,
        PresentationOp::Previous,
        PresentationOp::GoTo,
        PresentationOp::First,
        PresentationOp::Last,
        PresentationOp::TogglePause,
        PresentationOp::ToggleFullscreen,
        PresentationOp::Exit,
        PresentationOp::Reset,
        PresentationOp::Narrate,
        PresentationOp::ExtendTiming,
        PresentationOp::CurrentSlide,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PresentationOp::Next => "nextSlide",
            PresentationOp::Previous => "previousSlide",
            PresentationOp::GoTo => "goToSlide",
            PresentationOp::First => "firstSlide",
            PresentationOp::Last => "lastSlide",
            PresentationOp::TogglePause => "togglePause",
            PresentationOp::ToggleFullscreen => "toggleFullscreen",
            PresentationOp::Exit => "exit",
            PresentationOp::Reset => "reset",
            PresentationOp::Narrate => "narrate",
            PresentationOp::ExtendTiming => "extendCurrentSlideTiming",
            PresentationOp::CurrentSlide => "currentSlide",
        }
    }

    fn apply(&self, controls: &dyn PresentationControls, args: &Value) -> ToolResult {
        match self {
            PresentationOp::Next => controls.next_slide(),
            PresentationOp::Previous => controls.previous_slide(),
            PresentationOp::GoTo => match slide_arg(args) {
                Some(number) => controls.go_to_slide(number),
                None => ToolResult::failure("Tell me which slide number to go to."),
            },
            PresentationOp::First => controls.first_slide(),
            PresentationOp::Last => controls.last_slide(),
            PresentationOp::TogglePause => controls.toggle_pause(),
            PresentationOp::ToggleFullscreen => controls.toggle_fullscreen(),
            PresentationOp::Exit => controls.exit(),
            PresentationOp::Reset => controls.reset(),
            PresentationOp::Narrate => controls.narrate(slide_arg(args)),
            PresentationOp::ExtendTiming => controls.extend_current_slide_timing(),
            PresentationOp::CurrentSlide => {
                let current = controls.current_slide();
                ToolResult::ok(format!("The presentation is on slide {current}.")).with_field("slide", current)
            }
        }
    }
}

fn slide_arg(args: &Value) -> Option<usize> {
    args.get("slide").and_then(Value::as_u64).map(|n| n as usize)
}

/// Typed front for the "presentation" area of the registry.
#[derive(Clone)]
pub struct PresentationBridge {
    registry: Arc<CapabilityRegistry>,
}

impl PresentationBridge {
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        Self { registry }
    }

    /// Registers `controls` as the current presentation. The registry keeps
    /// only a weak reference, so a dropped viewer can never be driven.
    pub fn attach(&self, controls: &Arc<dyn PresentationControls>) -> RegistrationHandle {
        let mut set = CapabilitySet::new();
        for op in PresentationOp::ALL {
            let weak: Weak<dyn PresentationControls> = Arc::downgrade(controls);
            set = set.with(op.as_str(), move |args| match weak.upgrade() {
                Some(controls) => op.apply(controls.as_ref(), args),
                None => ToolResult::failure(NO_PRESENTATION).with_field("unavailable", true),
            });
        }
        self.registry.register(PRESENTATION_AREA, set)
    }

    pub fn detach(&self, handle: RegistrationHandle) -> bool {
        self.registry.release(handle)
    }

    pub fn is_active(&self) -> bool {
        self.registry.is_registered(PRESENTATION_AREA)
    }

    fn call(&self, op: PresentationOp, args: Value) -> ToolResult {
        match self.registry.try_invoke(PRESENTATION_AREA, op.as_str(), &args) {
            Ok(result) => result,
            Err(CapabilityError::AreaUnavailable(_)) => {
                tracing::info!(operation = op.as_str(), "no presentation registered");
                ToolResult::failure(NO_PRESENTATION).with_field("unavailable", true)
            }
            Err(e) => {
                tracing::warn!(operation = op.as_str(), "presentation operation missing: {}", e);
                ToolResult::failure(format!(
                    "The presentation on screen can't do \"{}\" right now.",
                    op.as_str()
                ))
                .with_field("unavailable", true)
            }
        }
    }

    pub fn next_slide(&self) -> ToolResult {
        self.call(PresentationOp::Next, Value::Null)
    }

    pub fn previous_slide(&self) -> ToolResult {
        self.call(PresentationOp::Previous, Value::Null)
    }

    pub fn go_to_slide(&self, number: usize) -> ToolResult {
        self.call(PresentationOp::GoTo, json!({ "slide": number }))
    }

    pub fn first_slide(&self) -> ToolResult {
        self.call(PresentationOp::First, Value::Null)
    }

    pub fn last_slide(&self) -> ToolResult {
        self.call(PresentationOp::Last, Value::Null)
    }

    pub fn toggle_pause(&self) -> ToolResult {
        self.call(PresentationOp::TogglePause, Value::Null)
    }

    pub fn toggle_fullscreen(&self) -> ToolResult {
        self.call(PresentationOp::ToggleFullscreen, Value::Null)
    }

    pub fn exit(&self) -> ToolResult {
        self.call(PresentationOp::Exit, Value::Null)
    }

    pub fn reset(&self) -> ToolResult {
        self.call(PresentationOp::Reset, Value::Null)
    }

    pub fn narrate(&self, number: Option<usize>) -> ToolResult {
        let args = match number {
            Some(n) => json!({ "slide": n }),
            None => json!({}),
        };
        self.call(PresentationOp::Narrate, args)
    }

    pub fn extend_current_slide_timing(&self) -> ToolResult {
        self.call(PresentationOp::ExtendTiming, Value::Null)
    }

    /// 1-based index of the slide on screen, if a presentation is attached.
    pub fn current_slide(&self) -> Option<usize> {
        let result = self.call(PresentationOp::CurrentSlide, Value::Null);
        result
            .success
            .then(|| result.field("slide").and_then(Value::as_u64))
            .flatten()
            .map(|n| n as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bridge() -> PresentationBridge {
        PresentationBridge::new(Arc::new(CapabilityRegistry::new()))
    }

    #[test]
    fn every_operation_fails_softly_without_a_presentation() {
        let bridge = bridge();
        let results = [
            bridge.next_slide(),
            bridge.previous_slide(),
            bridge.go_to_slide(2),
            bridge.first_slide(),
            bridge.last_slide(),
            bridge.toggle_pause(),
            bridge.toggle_fullscreen(),
            bridge.exit(),
            bridge.reset(),
            bridge.narrate(None),
            bridge.extend_current_slide_timing(),
        ];
        for result in results {
            assert!(!result.success);
            assert_eq!(result.message, NO_PRESENTATION);
        }
        assert_eq!(bridge.current_slide(), None);
    }

    #[test]
    fn attached_controls_receive_calls() {
        let bridge = bridge();
        let mut mock = MockPresentationControls::new();
        mock.expect_go_to_slide()
            .withf(|n| *n == 3)
            .returning(|n| ToolResult::ok(format!("Moved to slide {n}.")))
            .once();
        mock.expect_current_slide().return_const(3usize);
        let controls: Arc<dyn PresentationControls> = Arc::new(mock);

        let _handle = bridge.attach(&controls);
        assert!(bridge.is_active());
        assert_eq!(bridge.go_to_slide(3).message, "Moved to slide 3.");
        assert_eq!(bridge.current_slide(), Some(3));
    }

    #[test]
    fn narrate_passes_optional_slide() {
        let bridge = bridge();
        let mut mock = MockPresentationControls::new();
        mock.expect_narrate()
            .withf(|n| n.is_none())
            .returning(|_| ToolResult::ok("current"))
            .once();
        mock.expect_narrate()
            .withf(|n| *n == Some(4))
            .returning(|_| ToolResult::ok("four"))
            .once();
        let controls: Arc<dyn PresentationControls> = Arc::new(mock);
        let _handle = bridge.attach(&controls);

        assert_eq!(bridge.narrate(None).message, "current");
        assert_eq!(bridge.narrate(Some(4)).message, "four");
    }

    #[test]
    fn dropped_viewer_is_unavailable() {
        let bridge = bridge();
        let controls: Arc<dyn PresentationControls> = Arc::new(MockPresentationControls::new());
        let _handle = bridge.attach(&controls);
        drop(controls);

        let result = bridge.next_slide();
        assert!(!result.success);
        assert_eq!(result.message, NO_PRESENTATION);
    }

    #[test]
    fn detach_clears_only_own_registration() {
        let bridge = bridge();
        let first: Arc<dyn PresentationControls> = Arc::new(MockPresentationControls::new());
        let mut newer = MockPresentationControls::new();
        newer.expect_next_slide().returning(|| ToolResult::ok("newer"));
        let second: Arc<dyn PresentationControls> = Arc::new(newer);

        let first_handle = bridge.attach(&first);
        let _second_handle = bridge.attach(&second);
        assert!(!bridge.detach(first_handle));
        assert_eq!(bridge.next_slide().message, "newer");
    }
}
