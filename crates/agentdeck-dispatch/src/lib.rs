//! Prompt classification and agent creation.
//!
//! Maps a free-text prompt onto one of the fixed agent categories and builds
//! the corresponding entity, provisioning the remote side where needed.

pub mod classifier;
pub mod dispatcher;

pub use classifier::{classify, MatchKind, Rule, RuleSet, RULES};
pub use dispatcher::{Dispatcher, NotionRefs};
