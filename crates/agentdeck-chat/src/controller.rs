//! The AgentDeck controller: dispatches prompts, sends messages and folds
//! the results into the application state.

use std::sync::Arc;
use std::time::Duration;

use agentdeck_backend::{AgentBackend, BackendError};
use agentdeck_core::config::BackendConfig;
use agentdeck_core::{Message, Timestamp};
use agentdeck_dispatch::Dispatcher;
use uuid::Uuid;

use crate::error::ChatError;
use crate::request::{build_request, OutboundRequest};
use crate::response::{decode_reply, FALLBACK_REPLY};
use crate::state::{AppEvent, AppState};
use crate::state_machine::ConversationPhase;

/// Controller settings.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Upper bound on a single backend call; `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        BackendConfig::default().into()
    }
}

impl From<BackendConfig> for ChatConfig {
    fn from(config: BackendConfig) -> Self {
        Self {
            request_timeout: config.request_timeout(),
        }
    }
}

/// Result of a settled send.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    /// The entity message appended to the conversation.
    pub reply: Message,
    /// False when the reply is [`FALLBACK_REPLY`].
    pub succeeded: bool,
}

/// Owns the application state and drives it from user actions.
pub struct AgentDeck<B> {
    dispatcher: Dispatcher<Arc<B>>,
    backend: Arc<B>,
    state: AppState,
    config: ChatConfig,
}

impl<B: AgentBackend> AgentDeck<B> {
    pub fn new(backend: B, config: ChatConfig) -> Self {
        let backend = Arc::new(backend);
        Self {
            dispatcher: Dispatcher::new(Arc::clone(&backend), config.request_timeout),
            backend,
            state: AppState::new(),
            config,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn dispatcher(&self) -> &Dispatcher<Arc<B>> {
        &self.dispatcher
    }

    /// Classify `prompt` and, if it matches, create and open a new entity.
    ///
    /// An unclassifiable prompt is a no-op and leaves the input buffer alone.
    pub async fn submit_prompt(&mut self, prompt: &str) -> Option<Uuid> {
        let entity = self.dispatcher.dispatch(prompt).await?;
        let id = entity.id;
        match self.state.apply(AppEvent::EntityCreated(entity)) {
            Ok(next) => {
                self.state = next;
                Some(id)
            }
            Err(e) => {
                tracing::warn!(entity_id = %id, error = %e, "Could not add entity");
                None
            }
        }
    }

    /// Open an existing entity's conversation.
    pub fn select(&mut self, id: Uuid) -> Result<(), ChatError> {
        self.state = self.state.apply(AppEvent::EntitySelected(id))?;
        Ok(())
    }

    /// Close the conversation and return to prompt entry.
    pub fn go_home(&mut self) {
        self.update(AppEvent::ReturnedHome);
    }

    /// Replace the pending input text.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.update(AppEvent::InputChanged(text.into()));
    }

    /// Send whatever is in the input buffer to the selected entity.
    pub async fn send_input(&mut self) -> Result<SendOutcome, ChatError> {
        let text = self.state.input().to_string();
        self.send_message(&text).await
    }

    /// Send `text` to the selected entity and wait for its reply.
    ///
    /// The user message is appended before the backend is called. Backend
    /// failures of any kind produce a [`FALLBACK_REPLY`] message rather than
    /// an error; `Err` is only returned when the send could not start.
    pub async fn send_message(&mut self, text: &str) -> Result<SendOutcome, ChatError> {
        let entity_id = self.state.selected().ok_or(ChatError::NoActiveEntity)?;
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let entity = self
            .state
            .entity(entity_id)
            .ok_or(ChatError::EntityNotFound(entity_id))?;
        if self.state.phase(entity_id) != ConversationPhase::Idle {
            return Err(ChatError::Busy(entity_id));
        }

        let request = build_request(entity, text);
        let message = Message::user(text, entity.next_timestamp());
        self.state = self
            .state
            .apply(AppEvent::SendStarted { entity_id, message })?;

        tracing::debug!(
            entity_id = %entity_id,
            endpoint = request.endpoint,
            "Sending message"
        );

        let (reply_text, succeeded) = match self.call(&request).await {
            Ok(reply) => (reply, true),
            Err(e) => {
                tracing::warn!(
                    entity_id = %entity_id,
                    endpoint = request.endpoint,
                    error = %e,
                    "Send failed; showing fallback reply"
                );
                (FALLBACK_REPLY.to_string(), false)
            }
        };

        let created_at = self
            .state
            .entity(entity_id)
            .map(|e| e.next_timestamp())
            .unwrap_or_else(Timestamp::now);
        let reply = Message::entity(reply_text, created_at);
        self.state = self.state.apply(AppEvent::ReplyReceived {
            entity_id,
            message: reply.clone(),
            succeeded,
        })?;

        Ok(SendOutcome { reply, succeeded })
    }

    async fn call(&self, request: &OutboundRequest) -> Result<String, BackendError> {
        let body = request
            .payload
            .to_value()
            .map_err(|e| BackendError::Encode(e.to_string()))?;
        let pending = self.backend.post_json(request.endpoint, &body);
        let value = match self.config.request_timeout {
            Some(limit) => tokio::time::timeout(limit, pending)
                .await
                .map_err(|_| BackendError::Timeout(limit))??,
            None => pending.await?,
        };
        decode_reply(value).map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn update(&mut self, event: AppEvent) {
        match self.state.apply(event) {
            Ok(next) => self.state = next,
            Err(e) => tracing::warn!(error = %e, "State update rejected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentdeck_core::{Category, MessageOrigin};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    type Reply = Result<Value, BackendError>;

    /// Backend that records requests and answers from a script.
    #[derive(Default)]
    struct MockBackend {
        calls: Mutex<Vec<(String, Value)>>,
        replies: Mutex<VecDeque<Reply>>,
        delay: Option<Duration>,
    }

    impl MockBackend {
        fn replying(replies: Vec<Reply>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<(String, Value)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AgentBackend for MockBackend {
        async fn post_json(&self, endpoint: &str, body: &Value) -> Result<Value, BackendError> {
            self.calls
                .lock()
                .unwrap()
                .push((endpoint.to_string(), body.clone()));
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(json!({"messages": "ok"})))
        }
    }

    fn deck(backend: MockBackend) -> AgentDeck<MockBackend> {
        AgentDeck::new(backend, ChatConfig::default())
    }

    fn chat_calls(deck: &AgentDeck<MockBackend>) -> Vec<(String, Value)> {
        deck.backend
            .calls()
            .into_iter()
            .filter(|(endpoint, _)| endpoint != "create-custom-notion-agent")
            .collect()
    }

    // =========================================================================
    // Prompt submission
    // =========================================================================

    #[tokio::test]
    async fn test_submit_prompt_creates_and_selects() {
        let mut deck = deck(MockBackend::default());
        let id = deck.submit_prompt("Create a habit tracker").await.unwrap();
        let entity = deck.state().selected_entity().unwrap();
        assert_eq!(entity.id, id);
        assert_eq!(entity.category, Category::HabitTracker);
        assert_eq!(deck.state().entities().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_unclassifiable_prompt_is_noop() {
        let mut deck = deck(MockBackend::default());
        deck.set_input("hello");
        assert!(deck.submit_prompt("hello").await.is_none());
        assert!(deck.state().entities().is_empty());
        assert_eq!(deck.state().input(), "hello");
        assert!(deck.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_submit_same_prompt_twice() {
        let mut deck = deck(MockBackend::default());
        let a = deck.submit_prompt("search for owls").await.unwrap();
        let b = deck.submit_prompt("search for owls").await.unwrap();
        assert_ne!(a, b);
        let entities = deck.state().entities();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].display_name, entities[1].display_name);
        assert_eq!(entities[0].description, entities[1].description);
    }

    // =========================================================================
    // Send preconditions
    // =========================================================================

    #[tokio::test]
    async fn test_send_without_selection() {
        let mut deck = deck(MockBackend::default());
        let err = deck.send_message("hi").await.unwrap_err();
        assert!(matches!(err, ChatError::NoActiveEntity));
    }

    #[tokio::test]
    async fn test_send_empty_message() {
        let mut deck = deck(MockBackend::default());
        deck.submit_prompt("search for owls").await.unwrap();
        let err = deck.send_message("   ").await.unwrap_err();
        assert!(matches!(err, ChatError::EmptyMessage));
        assert!(deck.state().selected_entity().unwrap().messages.is_empty());
        assert!(deck.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_send_after_going_home_fails() {
        let mut deck = deck(MockBackend::default());
        deck.submit_prompt("search for owls").await.unwrap();
        deck.go_home();
        let err = deck.send_message("hi").await.unwrap_err();
        assert!(matches!(err, ChatError::NoActiveEntity));
    }

    // =========================================================================
    // Success path
    // =========================================================================

    #[tokio::test]
    async fn test_send_success_appends_reply() {
        let mut deck = deck(MockBackend::replying(vec![Ok(
            json!({"messages": "Habit logged."}),
        )]));
        let id = deck.submit_prompt("Create a habit tracker").await.unwrap();

        let outcome = deck.send_message("I ran 5k").await.unwrap();
        assert!(outcome.succeeded);
        assert_eq!(outcome.reply.text, "Habit logged.");
        assert_eq!(outcome.reply.origin, MessageOrigin::Entity);

        let entity = deck.state().entity(id).unwrap();
        assert_eq!(entity.messages.len(), 2);
        assert_eq!(entity.messages[0].text, "I ran 5k");
        assert_eq!(entity.messages[0].origin, MessageOrigin::User);
        assert_eq!(entity.messages[1].id, outcome.reply.id);
        assert_eq!(deck.state().phase(id), ConversationPhase::Idle);

        assert_eq!(
            chat_calls(&deck),
            vec![("habit-tracker".to_string(), json!({"message": "I ran 5k"}))]
        );
    }

    #[tokio::test]
    async fn test_list_reply_joined() {
        let mut deck = deck(MockBackend::replying(vec![Ok(
            json!({"messages": ["first", "second"]}),
        )]));
        deck.submit_prompt("Summarize my physics notes").await.unwrap();
        let outcome = deck.send_message("entropy?").await.unwrap();
        assert_eq!(outcome.reply.text, "first\nsecond");
    }

    #[tokio::test]
    async fn test_search_sends_query_key() {
        let mut deck = deck(MockBackend::default());
        deck.submit_prompt("search for owls").await.unwrap();
        deck.send_message("barn owls").await.unwrap();

        let calls = chat_calls(&deck);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "search");
        assert_eq!(calls[0].1, json!({"query": "barn owls"}));
        assert!(calls[0].1.get("message").is_none());
    }

    #[tokio::test]
    async fn test_custom_notion_inline_reference() {
        let mut deck = deck(MockBackend::default());
        deck.submit_prompt("create me an agent to manage notes")
            .await
            .unwrap();
        deck.send_message("Update my page|abc-dxz").await.unwrap();

        let calls = chat_calls(&deck);
        assert_eq!(calls[0].0, "custom-notion");
        assert_eq!(
            calls[0].1,
            json!({"message": "Update my page", "notion_id": "abc-dxz", "page_id": "dxz"})
        );
    }

    #[tokio::test]
    async fn test_custom_notion_stored_reference() {
        let mut deck = deck(MockBackend::default());
        let id = deck
            .submit_prompt("create me an agent to manage notes")
            .await
            .unwrap();
        let entity = deck.state().entity(id).unwrap().clone();
        deck.send_message("Update my page").await.unwrap();

        let calls = deck.backend.calls();
        assert_eq!(calls[0].0, "create-custom-notion-agent");
        assert_eq!(calls[1].0, "custom-notion");
        assert_eq!(
            calls[1].1,
            json!({
                "message": "Update my page",
                "notion_id": entity.notion_id.unwrap(),
                "page_id": entity.page_id.unwrap(),
            })
        );
    }

    // =========================================================================
    // Failure path
    // =========================================================================

    #[tokio::test]
    async fn test_server_error_appends_fallback() {
        let mut deck = deck(MockBackend::replying(vec![Err(BackendError::Status(500))]));
        let id = deck.submit_prompt("code me an app for notes").await.unwrap();

        let outcome = deck.send_message("go").await.unwrap();
        assert!(!outcome.succeeded);
        assert_eq!(outcome.reply.text, FALLBACK_REPLY);

        let entity = deck.state().entity(id).unwrap();
        let entity_msgs: Vec<_> = entity
            .messages
            .iter()
            .filter(|m| m.origin == MessageOrigin::Entity)
            .collect();
        assert_eq!(entity_msgs.len(), 1);
        assert_eq!(entity_msgs[0].text, FALLBACK_REPLY);
        assert_eq!(deck.state().phase(id), ConversationPhase::Idle);
    }

    #[tokio::test]
    async fn test_missing_messages_field_is_failure() {
        let mut deck = deck(MockBackend::replying(vec![Ok(json!({"answer": "hi"}))]));
        deck.submit_prompt("search for owls").await.unwrap();
        let outcome = deck.send_message("x").await.unwrap();
        assert!(!outcome.succeeded);
        assert_eq!(outcome.reply.text, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_transport_error_is_failure() {
        let mut deck = deck(MockBackend::replying(vec![Err(BackendError::Transport(
            "connection refused".to_string(),
        ))]));
        deck.submit_prompt("search for owls").await.unwrap();
        let outcome = deck.send_message("x").await.unwrap();
        assert!(!outcome.succeeded);
    }

    #[tokio::test]
    async fn test_timeout_is_failure() {
        let backend = MockBackend {
            delay: Some(Duration::from_secs(5)),
            ..MockBackend::default()
        };
        let mut deck = AgentDeck::new(
            backend,
            ChatConfig {
                request_timeout: Some(Duration::from_millis(50)),
            },
        );
        let id = deck.submit_prompt("search for owls").await.unwrap();
        let outcome = deck.send_message("x").await.unwrap();
        assert!(!outcome.succeeded);
        assert_eq!(outcome.reply.text, FALLBACK_REPLY);
        assert_eq!(deck.state().phase(id), ConversationPhase::Idle);
    }

    #[tokio::test]
    async fn test_slow_provisioning_is_bounded_by_timeout() {
        let backend = MockBackend {
            delay: Some(Duration::from_secs(2)),
            ..MockBackend::default()
        };
        let mut deck = AgentDeck::new(
            backend,
            ChatConfig {
                request_timeout: Some(Duration::from_millis(50)),
            },
        );

        let started = std::time::Instant::now();
        let id = deck
            .submit_prompt("create me an agent to manage notes")
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_millis(500));
        let entity = deck.state().entity(id).unwrap();
        assert_eq!(entity.category, Category::CustomNotion);
        assert!(entity.notion_id.is_some());
    }

    #[tokio::test]
    async fn test_recovers_after_failure() {
        let mut deck = deck(MockBackend::replying(vec![
            Err(BackendError::Status(502)),
            Ok(json!({"messages": "back online"})),
        ]));
        deck.submit_prompt("search for owls").await.unwrap();
        assert!(!deck.send_message("one").await.unwrap().succeeded);
        let outcome = deck.send_message("two").await.unwrap();
        assert!(outcome.succeeded);
        assert_eq!(outcome.reply.text, "back online");
    }

    // =========================================================================
    // Input buffer
    // =========================================================================

    #[tokio::test]
    async fn test_send_input_clears_buffer_on_success() {
        let mut deck = deck(MockBackend::default());
        deck.submit_prompt("search for owls").await.unwrap();
        deck.set_input("snowy owls");
        deck.send_input().await.unwrap();
        assert_eq!(deck.state().input(), "");
        assert_eq!(chat_calls(&deck)[0].1, json!({"query": "snowy owls"}));
    }

    #[tokio::test]
    async fn test_send_input_clears_buffer_on_failure() {
        let mut deck = deck(MockBackend::replying(vec![Err(BackendError::Status(500))]));
        deck.submit_prompt("search for owls").await.unwrap();
        deck.set_input("snowy owls");
        deck.send_input().await.unwrap();
        assert_eq!(deck.state().input(), "");
    }

    // =========================================================================
    // Ordering
    // =========================================================================

    #[tokio::test]
    async fn test_messages_alternate_and_stay_chronological() {
        let mut deck = deck(MockBackend::replying(vec![
            Ok(json!({"messages": "a"})),
            Err(BackendError::Status(500)),
            Ok(json!({"messages": ["b", "c"]})),
            Err(BackendError::Decode("bad".to_string())),
            Ok(json!({"messages": "d"})),
        ]));
        let id = deck.submit_prompt("search for owls").await.unwrap();
        for i in 0..5 {
            deck.send_message(&format!("message {}", i)).await.unwrap();
        }

        let messages = &deck.state().entity(id).unwrap().messages;
        assert_eq!(messages.len(), 10);
        for (i, pair) in messages.chunks(2).enumerate() {
            assert_eq!(pair[0].origin, MessageOrigin::User);
            assert_eq!(pair[0].text, format!("message {}", i));
            assert_eq!(pair[1].origin, MessageOrigin::Entity);
        }
        assert!(messages
            .windows(2)
            .all(|w| w[0].created_at <= w[1].created_at));
    }

    #[tokio::test]
    async fn test_conversations_are_per_entity() {
        let mut deck = deck(MockBackend::default());
        let a = deck.submit_prompt("search for owls").await.unwrap();
        deck.send_message("x").await.unwrap();
        let b = deck.submit_prompt("Create a habit tracker").await.unwrap();
        deck.send_message("y").await.unwrap();

        assert_eq!(deck.state().entity(a).unwrap().messages.len(), 2);
        assert_eq!(deck.state().entity(b).unwrap().messages.len(), 2);

        deck.select(a).unwrap();
        deck.send_message("z").await.unwrap();
        assert_eq!(deck.state().entity(a).unwrap().messages.len(), 4);
        assert_eq!(deck.state().entity(b).unwrap().messages.len(), 2);
    }

    #[tokio::test]
    async fn test_select_unknown_entity() {
        let mut deck = deck(MockBackend::default());
        let err = deck.select(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ChatError::EntityNotFound(_)));
    }

    #[test]
    fn test_chat_config_from_backend_config() {
        let config: ChatConfig = BackendConfig {
            base_url: "http://x".to_string(),
            request_timeout_secs: 7,
        }
        .into();
        assert_eq!(config.request_timeout, Some(Duration::from_secs(7)));
    }
}
