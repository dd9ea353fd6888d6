//! Conversation handling for AgentDeck.
//!
//! Builds per-category backend requests, decodes replies, tracks each
//! entity's conversation phase and keeps the application state behind a
//! reducer.

pub mod controller;
pub mod error;
pub mod request;
pub mod response;
pub mod state;
pub mod state_machine;

pub use controller::{AgentDeck, ChatConfig, SendOutcome};
pub use error::ChatError;
pub use request::{build_request, ChatPayload, OutboundRequest};
pub use response::{decode_reply, ReplyBody, ReplyMessages, FALLBACK_REPLY};
pub use state::{AppEvent, AppState, View};
pub use state_machine::{validate_transition, ConversationPhase};
