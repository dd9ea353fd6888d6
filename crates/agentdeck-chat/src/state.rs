//! Application state and its reducer.
//!
//! `AppState` is never mutated in place: `apply` returns the next state and
//! replaces the entity collection wholesale whenever it changes, so earlier
//! snapshots stay valid.

use std::collections::HashMap;
use std::sync::Arc;

use agentdeck_core::{Entity, Message};
use uuid::Uuid;

use crate::error::ChatError;
use crate::state_machine::{validate_transition, ConversationPhase};

/// Which screen the front end shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    /// Prompt entry; new agents are created from here.
    #[default]
    Home,
    /// Conversation with the selected agent.
    Chat,
}

/// Everything that can change the application state.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A new entity was classified; it is appended and opened.
    EntityCreated(Entity),
    EntitySelected(Uuid),
    ReturnedHome,
    InputChanged(String),
    /// The user's message is appended before the backend answers.
    SendStarted { entity_id: Uuid, message: Message },
    /// The backend settled, successfully or not.
    ReplyReceived {
        entity_id: Uuid,
        message: Message,
        succeeded: bool,
    },
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    entities: Arc<Vec<Entity>>,
    selected: Option<Uuid>,
    view: View,
    phases: HashMap<Uuid, ConversationPhase>,
    input: String,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the state that follows `event`.
    pub fn apply(&self, event: AppEvent) -> Result<AppState, ChatError> {
        let mut next = self.clone();
        match event {
            AppEvent::EntityCreated(entity) => {
                let id = entity.id;
                next.entities = Arc::new(with_appended(&self.entities, entity));
                next.phases.insert(id, ConversationPhase::Idle);
                next.selected = Some(id);
                next.view = View::Chat;
                next.input.clear();
            }
            AppEvent::EntitySelected(id) => {
                if self.entity(id).is_none() {
                    return Err(ChatError::EntityNotFound(id));
                }
                next.selected = Some(id);
                next.view = View::Chat;
            }
            AppEvent::ReturnedHome => {
                next.selected = None;
                next.view = View::Home;
            }
            AppEvent::InputChanged(text) => {
                next.input = text;
            }
            AppEvent::SendStarted { entity_id, message } => {
                validate_transition(self.phase(entity_id), ConversationPhase::Sending)?;
                next.entities = Arc::new(self.with_message(entity_id, message)?);
                next.phases.insert(entity_id, ConversationPhase::Sending);
            }
            AppEvent::ReplyReceived {
                entity_id,
                message,
                succeeded,
            } => {
                let outcome = if succeeded {
                    ConversationPhase::Success
                } else {
                    ConversationPhase::Failure
                };
                validate_transition(self.phase(entity_id), outcome)?;
                validate_transition(outcome, ConversationPhase::Idle)?;
                next.entities = Arc::new(self.with_message(entity_id, message)?);
                next.phases.insert(entity_id, ConversationPhase::Idle);
                next.input.clear();
            }
        }
        Ok(next)
    }

    /// All entities in creation order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity(&self, id: Uuid) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn selected(&self) -> Option<Uuid> {
        self.selected
    }

    pub fn selected_entity(&self) -> Option<&Entity> {
        self.selected.and_then(|id| self.entity(id))
    }

    /// Current phase of an entity's conversation (`Idle` if unknown).
    pub fn phase(&self, id: Uuid) -> ConversationPhase {
        self.phases.get(&id).copied().unwrap_or_default()
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// Pending text in the input field.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// A copy of the collection with `message` appended to one entity.
    fn with_message(&self, entity_id: Uuid, message: Message) -> Result<Vec<Entity>, ChatError> {
        let mut entities = self.entities.as_ref().clone();
        let entity = entities
            .iter_mut()
            .find(|e| e.id == entity_id)
            .ok_or(ChatError::EntityNotFound(entity_id))?;
        entity.push_message(message)?;
        Ok(entities)
    }
}

fn with_appended(entities: &[Entity], entity: Entity) -> Vec<Entity> {
    let mut out = Vec::with_capacity(entities.len() + 1);
    out.extend_from_slice(entities);
    out.push(entity);
    out
}
