mod client;
mod traits;
mod types;

pub use client::{AuraClient, AuraConfig};
pub use traits::ChatTransport;
pub use types::{ChatTurn, ConversationHistory, HealthStatus, HistoryEntry};
