//! Entity creation from classified prompts.

use std::time::Duration;

use agentdeck_backend::{AgentBackend, BackendError, CREATE_CUSTOM_NOTION_ENDPOINT};
use agentdeck_core::{Category, Entity, Timestamp};
use serde::Serialize;

use crate::classifier::RuleSet;

/// External references of a custom-notion agent.
///
/// `page_id` is always the part of `notion_id` after its first hyphen, the
/// same split the chat controller applies to inline `notion|ref` overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotionRefs {
    pub notion_id: String,
    pub page_id: String,
}

impl NotionRefs {
    /// Derive references from a creation time.
    pub fn from_timestamp(ts: Timestamp) -> Self {
        let page_id = ts.0.to_string();
        Self {
            notion_id: format!("notion-{}", page_id),
            page_id,
        }
    }
}

#[derive(Serialize)]
struct ProvisionRequest<'a> {
    notion_id: &'a str,
    page_id: &'a str,
    description: &'a str,
}

/// Turns prompts into entities.
pub struct Dispatcher<B> {
    rules: RuleSet,
    backend: B,
    /// Bound on the provisioning call; `None` waits indefinitely.
    timeout: Option<Duration>,
}

impl<B: AgentBackend> Dispatcher<B> {
    pub fn new(backend: B, timeout: Option<Duration>) -> Self {
        Self::with_rules(backend, RuleSet::new(), timeout)
    }

    pub fn with_rules(backend: B, rules: RuleSet, timeout: Option<Duration>) -> Self {
        Self {
            rules,
            backend,
            timeout,
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Classify `prompt` and build a new entity for it.
    ///
    /// Returns `None` when no rule matches. The prompt is kept verbatim as the
    /// description. For custom-notion entities the remote agent is provisioned
    /// first; a failed or timed-out provisioning call is logged and the entity
    /// is still returned.
    pub async fn dispatch(&self, prompt: &str) -> Option<Entity> {
        let Some(category) = self.rules.classify(prompt) else {
            tracing::debug!(prompt_len = prompt.len(), "Prompt matched no category");
            return None;
        };

        let mut entity = Entity::new(category, prompt);

        if category == Category::CustomNotion {
            let refs = NotionRefs::from_timestamp(entity.created_at);
            self.provision(&refs, prompt).await;
            entity = entity.with_refs(refs.notion_id, refs.page_id);
        }

        tracing::info!(
            entity_id = %entity.id,
            category = %category,
            "Created {}",
            entity.display_name
        );
        Some(entity)
    }

    async fn provision(&self, refs: &NotionRefs, description: &str) {
        let request = ProvisionRequest {
            notion_id: &refs.notion_id,
            page_id: &refs.page_id,
            description,
        };
        let body = match serde_json::to_value(&request) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode provisioning request");
                return;
            }
        };

        let pending = self.backend.post_json(CREATE_CUSTOM_NOTION_ENDPOINT, &body);
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, pending)
                .await
                .unwrap_or(Err(BackendError::Timeout(limit))),
            None => pending.await,
        };

        match result {
            Ok(_) => tracing::info!(notion_id = %refs.notion_id, "Custom notion agent provisioned"),
            Err(e) => tracing::warn!(
                notion_id = %refs.notion_id,
                error = %e,
                "Custom notion agent provisioning failed; continuing without it"
            ),
        }
    }
}
