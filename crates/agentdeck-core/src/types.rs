use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{AgentDeckError, Result};

// =============================================================================
// Enums
// =============================================================================

/// The fixed set of agent categories a prompt can be classified into.
///
/// The wire name doubles as the backend endpoint path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    HabitTracker,
    PhysicsNotes,
    DesktopAgent,
    CustomNotion,
    Search,
}

impl Category {
    /// Every category, in classification priority order.
    pub const ALL: [Category; 5] = [
        Category::HabitTracker,
        Category::PhysicsNotes,
        Category::DesktopAgent,
        Category::CustomNotion,
        Category::Search,
    ];

    /// Wire name, also used as the chat endpoint path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::HabitTracker => "habit-tracker",
            Category::PhysicsNotes => "physics-notes",
            Category::DesktopAgent => "desktop-agent",
            Category::CustomNotion => "custom-notion",
            Category::Search => "search",
        }
    }

    /// Human-readable name given to entities of this category.
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::HabitTracker => "Habit Tracker",
            Category::PhysicsNotes => "Physics Notes",
            Category::DesktopAgent => "Desktop Agent",
            Category::CustomNotion => "Custom Notion Agent",
            Category::Search => "Search Agent",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageOrigin {
    User,
    Entity,
}

impl fmt::Display for MessageOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageOrigin::User => write!(f, "user"),
            MessageOrigin::Entity => write!(f, "entity"),
        }
    }
}

// =============================================================================
// Newtype Wrappers - Temporal
// =============================================================================

/// Unix timestamp in milliseconds since epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp_millis())
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.0).unwrap_or_default()
    }
}

// =============================================================================
// Domain Structs
// =============================================================================

/// A single chat message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub text: String,
    pub origin: MessageOrigin,
    pub created_at: Timestamp,
}

impl Message {
    pub fn new(text: impl Into<String>, origin: MessageOrigin, created_at: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            origin,
            created_at,
        }
    }

    pub fn user(text: impl Into<String>, created_at: Timestamp) -> Self {
        Self::new(text, MessageOrigin::User, created_at)
    }

    pub fn entity(text: impl Into<String>, created_at: Timestamp) -> Self {
        Self::new(text, MessageOrigin::Entity, created_at)
    }
}

/// An agent created from a classified prompt, owning its conversation.
///
/// `notion_id` and `page_id` are only populated for
/// [`Category::CustomNotion`] entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: Uuid,
    pub display_name: String,
    pub category: Category,
    pub description: String,
    pub notion_id: Option<String>,
    pub page_id: Option<String>,
    pub messages: Vec<Message>,
    pub created_at: Timestamp,
}

impl Entity {
    /// Create an entity with the category's fixed display name and no messages.
    pub fn new(category: Category, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name: category.display_name().to_string(),
            category,
            description: description.into(),
            notion_id: None,
            page_id: None,
            messages: Vec::new(),
            created_at: Timestamp::now(),
        }
    }

    /// Attach external references (custom-notion only).
    pub fn with_refs(mut self, notion_id: impl Into<String>, page_id: impl Into<String>) -> Self {
        self.notion_id = Some(notion_id.into());
        self.page_id = Some(page_id.into());
        self
    }

    /// Append a message, keeping the history chronological.
    pub fn push_message(&mut self, message: Message) -> Result<()> {
        if let Some(last) = self.messages.last() {
            if message.created_at < last.created_at {
                return Err(AgentDeckError::OutOfOrder {
                    last: last.created_at,
                    incoming: message.created_at,
                });
            }
        }
        self.messages.push(message);
        Ok(())
    }

    /// Timestamp for the next message: now, but never earlier than the last one.
    pub fn next_timestamp(&self) -> Timestamp {
        let now = Timestamp::now();
        match self.messages.last() {
            Some(last) if last.created_at > now => last.created_at,
            _ => now,
        }
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

// =============================================================================
// Tests
// =============================================================================
