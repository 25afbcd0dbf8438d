//! Chat session controller and its render-facing event surface.

mod controller;
mod events;
mod state;

pub use controller::{ChatSession, SEND_FAILURE_NOTICE};
pub use events::SessionEvent;
pub use state::SessionPhase;
