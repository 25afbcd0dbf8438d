mod event;
mod message;
mod sse;

pub use event::StreamEvent;
pub use message::{ChatMessage, ChatRole};
pub use sse::{event_stream, EventStream};
