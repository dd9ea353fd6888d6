//! Reply decoding.

use serde::Deserialize;
use serde_json::Value;

/// Text shown in place of a reply whenever a send fails for any reason.
pub const FALLBACK_REPLY: &str =
    "Sorry, I encountered an error while processing your request. Please try again.";

/// `messages` may be a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ReplyMessages {
    One(String),
    Many(Vec<String>),
}

impl ReplyMessages {
    /// Flatten to display text; lists are joined with newlines.
    pub fn into_text(self) -> String {
        match self {
            ReplyMessages::One(text) => text,
            ReplyMessages::Many(parts) => parts.join("\n"),
        }
    }
}

/// Successful response body from a chat endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplyBody {
    pub messages: ReplyMessages,
}

/// Extract the reply text from a response body.
pub fn decode_reply(body: Value) -> Result<String, serde_json::Error> {
    if !body.is_object() {
        return Err(serde::de::Error::custom("response body is not a JSON object"));
    }
    let reply: ReplyBody = serde_json::from_value(body)?;
    Ok(reply.messages.into_text())
}
