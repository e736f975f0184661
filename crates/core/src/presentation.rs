//! Slide decks, the narration timing model and the on-screen viewer.

mod deck;
pub mod narration;
mod viewer;

pub use deck::{builtin, Presentation, Slide, BUILTIN_IDS};
pub use viewer::{MountedPresentation, NarrationSink, PresentationViewer, ViewerSnapshot};

#[cfg(test)]
pub use viewer::MockNarrationSink;
