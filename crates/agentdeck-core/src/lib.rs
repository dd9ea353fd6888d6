pub mod config;
pub mod error;
pub mod types;

pub use config::AgentDeckConfig;
pub use error::{AgentDeckError, Result};
pub use types::*;
