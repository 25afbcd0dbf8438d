//! Client library for the Aura chat backend.
//!
//! Connects a rendering surface to the backend's REST API: a typed HTTP
//! client ([`api::AuraClient`]), an incremental decoder for the streaming
//! reply format ([`chat::event_stream`]), a session controller owning the
//! transcript state machine ([`session::ChatSession`]), and local
//! persistence for conversation snapshots and preferences ([`store`]).
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use aura_chat::api::AuraClient;
//! use aura_chat::session::ChatSession;
//! use aura_chat::store::StateStore;
//!
//! # async fn run() -> Result<(), aura_chat::ChatError> {
//! let client = Arc::new(AuraClient::new("http://localhost:8000", Some(30)));
//! let session = ChatSession::new(client, StateStore::in_memory());
//!
//! session.submit("Hello!").await?;
//! for message in session.transcript() {
//!     println!("{}: {}", message.role, message.content);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod chat;
pub mod error;
pub mod registry;
pub mod session;
pub mod settings;
pub mod store;

pub use error::ChatError;
pub use session::{ChatSession, SessionEvent};
