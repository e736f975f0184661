//! Voice control core for the presentation site.
//!
//! A single [`SessionContext`] owns the realtime voice session, the tool
//! catalog the model may call, and the capability registry that presentation
//! viewers publish their controls into while they are mounted.

pub mod backends;
pub mod bridge;
pub mod config;
pub mod context;
pub mod error;
pub mod navigation;
pub mod notify;
pub mod presentation;
pub mod registry;
pub mod session;
pub mod shell;
pub mod tools;

pub use context::SessionContext;
pub use session::{SessionAudio, SessionManager, SessionStatus};
