//! Conversation state machine with validated transitions.
//!
//! Idle -> Sending -> Success/Failure -> Idle

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ChatError;

/// Where an entity's conversation is in the send cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationPhase {
    #[default]
    Idle,
    Sending,
    Success,
    Failure,
}

impl fmt::Display for ConversationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationPhase::Idle => write!(f, "idle"),
            ConversationPhase::Sending => write!(f, "sending"),
            ConversationPhase::Success => write!(f, "success"),
            ConversationPhase::Failure => write!(f, "failure"),
        }
    }
}

/// Validate that a phase transition is allowed.
///
/// Valid transitions:
/// - Idle -> Sending
/// - Sending -> Success
/// - Sending -> Failure
/// - Success -> Idle
/// - Failure -> Idle
pub fn validate_transition(
    from: ConversationPhase,
    to: ConversationPhase,
) -> Result<(), ChatError> {
    let valid = matches!(
        (from, to),
        (ConversationPhase::Idle, ConversationPhase::Sending)
            | (ConversationPhase::Sending, ConversationPhase::Success)
            | (ConversationPhase::Sending, ConversationPhase::Failure)
            | (ConversationPhase::Success, ConversationPhase::Idle)
            | (ConversationPhase::Failure, ConversationPhase::Idle)
    );

    if valid {
        Ok(())
    } else {
        Err(ChatError::InvalidTransition(from, to))
    }
}
