//! Error types for the conversation controller.

use agentdeck_core::AgentDeckError;
use uuid::Uuid;

use crate::state_machine::ConversationPhase;

/// Errors from the chat controller.
///
/// Backend failures are not represented here: they become a fallback reply
/// in the conversation instead.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("no agent is selected")]
    NoActiveEntity,
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("agent {0} is still waiting for a reply")]
    Busy(Uuid),
    #[error("agent not found: {0}")]
    EntityNotFound(Uuid),
    #[error("invalid conversation transition: {0} -> {1}")]
    InvalidTransition(ConversationPhase, ConversationPhase),
    #[error("model error: {0}")]
    Model(#[from] AgentDeckError),
}
