//! Per-category request construction.

use agentdeck_core::{Category, Entity};
use serde::Serialize;
use serde_json::Value;

/// JSON body sent to a chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ChatPayload {
    /// habit-tracker, physics-notes, desktop-agent.
    Message { message: String },
    /// search uses `query` instead of `message`.
    Query { query: String },
    CustomNotion {
        message: String,
        notion_id: String,
        page_id: String,
    },
}

impl ChatPayload {
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// A fully resolved request: where to send it and what to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub endpoint: &'static str,
    pub payload: ChatPayload,
}

/// Build the backend request for `text` sent to `entity`.
pub fn build_request(entity: &Entity, text: &str) -> OutboundRequest {
    let payload = match entity.category {
        Category::HabitTracker | Category::PhysicsNotes | Category::DesktopAgent => {
            ChatPayload::Message {
                message: text.to_string(),
            }
        }
        Category::Search => ChatPayload::Query {
            query: text.to_string(),
        },
        Category::CustomNotion => custom_notion_payload(entity, text),
    };

    OutboundRequest {
        endpoint: entity.category.as_str(),
        payload,
    }
}

/// `message|prefix-suffix` overrides the stored references for one send.
fn custom_notion_payload(entity: &Entity, text: &str) -> ChatPayload {
    match text.split_once('|') {
        Some((message, reference)) => {
            let reference = reference.trim();
            let page_id = reference
                .split_once('-')
                .map(|(_, suffix)| suffix)
                .unwrap_or("");
            ChatPayload::CustomNotion {
                message: message.trim().to_string(),
                notion_id: reference.to_string(),
                page_id: page_id.to_string(),
            }
        }
        None => ChatPayload::CustomNotion {
            message: text.to_string(),
            notion_id: entity.notion_id.clone().unwrap_or_default(),
            page_id: entity.page_id.clone().unwrap_or_default(),
        },
    }
}
