//! AgentDeck client binary - composition root.
//!
//! 1. Parse CLI flags and load configuration from TOML
//! 2. Initialize tracing (stderr, so it stays out of the conversation)
//! 3. Build the HTTP backend and the controller
//! 4. Run the interactive loop on stdin/stdout

mod cli;
mod repl;

use clap::Parser;

use agentdeck_backend::HttpBackend;
use agentdeck_chat::{AgentDeck, ChatConfig};
use agentdeck_core::config::AgentDeckConfig;
use agentdeck_dispatch::classify;

use cli::{CliArgs, Command};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let config = if config_file.exists() {
        AgentDeckConfig::load_or_default(&config_file)
    } else {
        AgentDeckConfig::default()
    };

    let log_level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting AgentDeck v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!(path = %config_file.display(), "Configuration resolved");

    if let Some(Command::Classify { prompt }) = args.command.as_ref() {
        let prompt = prompt.join(" ");
        match classify(&prompt) {
            Some(category) => println!("{} ({})", category, category.display_name()),
            None => println!("no match"),
        }
        return Ok(());
    }

    let backend_config = args.resolve_backend(config.backend.clone());
    let backend = HttpBackend::new(
        &backend_config.base_url,
        backend_config.request_timeout(),
    )?;
    tracing::info!(base_url = %backend.base_url(), "Using agent backend");

    let mut deck = AgentDeck::new(backend, ChatConfig::from(backend_config));

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    repl::run(&mut deck, stdin, stdout).await?;

    tracing::debug!(
        agents = deck.state().entities().len(),
        "Session ended"
    );
    Ok(())
}
