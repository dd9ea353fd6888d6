//! CLI argument definitions for the AgentDeck client.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use agentdeck_core::config::BackendConfig;

/// AgentDeck: turn a prompt into an agent and chat with it.
#[derive(Parser, Debug)]
#[command(name = "agentdeck", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Base URL of the agent backend.
    #[arg(short = 'u', long = "base-url")]
    pub base_url: Option<String>,

    /// Seconds to wait for a backend reply (0 waits forever).
    #[arg(short = 't', long = "timeout-secs")]
    pub timeout_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Show which agent a prompt would create, without contacting the backend.
    Classify {
        /// The prompt to classify.
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > AGENTDECK_CONFIG env var > ~/.agentdeck/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("AGENTDECK_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Apply flag and env overrides on top of the file's backend section.
    ///
    /// Priority: --base-url flag > AGENTDECK_BASE_URL env var > config file.
    pub fn resolve_backend(&self, mut config: BackendConfig) -> BackendConfig {
        if let Some(ref url) = self.base_url {
            config.base_url = url.clone();
        } else if let Ok(url) = std::env::var("AGENTDECK_BASE_URL") {
            if !url.trim().is_empty() {
                config.base_url = url;
            }
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout_secs = secs;
        }
        config
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".agentdeck").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".agentdeck").join("config.toml");
    }
    PathBuf::from("config.toml")
}
