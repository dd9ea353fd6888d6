//! Client side of the remote agent backend.
//!
//! Defines the `AgentBackend` seam the dispatcher and chat controller talk
//! through, plus the reqwest-backed HTTP implementation.

pub mod error;
pub mod http;

use async_trait::async_trait;
use serde_json::Value;

pub use error::BackendError;
pub use http::HttpBackend;

/// Endpoint that provisions the remote side of a custom-notion agent.
pub const CREATE_CUSTOM_NOTION_ENDPOINT: &str = "create-custom-notion-agent";

/// A remote service that accepts JSON POSTs and answers with JSON.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// POST `body` to `endpoint` (relative to the backend's base address).
    ///
    /// Non-2xx statuses and undecodable bodies are errors.
    async fn post_json(&self, endpoint: &str, body: &Value) -> Result<Value, BackendError>;
}

#[async_trait]
impl<B: AgentBackend + ?Sized> AgentBackend for std::sync::Arc<B> {
    async fn post_json(&self, endpoint: &str, body: &Value) -> Result<Value, BackendError> {
        (**self).post_json(endpoint, body).await
    }
}
