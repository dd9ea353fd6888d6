//! Line-oriented front end.
//!
//! On the home view a line is a prompt that may create an agent; inside a
//! conversation a line is a message to the selected agent. Lines starting
//! with `/` are commands.

use agentdeck_backend::AgentBackend;
use agentdeck_chat::{AgentDeck, View};
use agentdeck_core::{Entity, Message, MessageOrigin};
use agentdeck_dispatch::MatchKind;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Empty,
    Text(String),
    List,
    /// 1-based index as shown by `/list`.
    Open(usize),
    Home,
    History,
    Help,
    Quit,
    Unknown(String),
}

pub fn parse_line(line: &str) -> ReplCommand {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ReplCommand::Empty;
    }
    let Some(command) = trimmed.strip_prefix('/') else {
        return ReplCommand::Text(line.trim_end_matches(['\r', '\n']).to_string());
    };

    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("list" | "ls"), None) => ReplCommand::List,
        (Some("open"), Some(n)) => match n.parse::<usize>() {
            Ok(i) if i > 0 => ReplCommand::Open(i),
            _ => ReplCommand::Unknown(trimmed.to_string()),
        },
        (Some("home" | "back"), None) => ReplCommand::Home,
        (Some("history"), None) => ReplCommand::History,
        (Some("help" | "?"), None) => ReplCommand::Help,
        (Some("quit" | "exit" | "q"), None) => ReplCommand::Quit,
        _ => ReplCommand::Unknown(trimmed.to_string()),
    }
}

const HELP: &str = "\
Commands:
  /list        show all agents
  /open <n>    open agent number n
  /home        leave the current conversation
  /history     show the current conversation
  /help        show this help
  /quit        exit
";

/// Drive `deck` from `input` until EOF or `/quit`.
pub async fn run<B, R, W>(deck: &mut AgentDeck<B>, input: R, mut out: W) -> std::io::Result<()>
where
    B: AgentBackend,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    out.write_all(b"Describe the agent you need. /help for commands.\n")
        .await?;

    loop {
        out.write_all(prompt_label(deck).as_bytes()).await?;
        out.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_line(&line) {
            ReplCommand::Empty => {}
            ReplCommand::Quit => break,
            ReplCommand::Help => out.write_all(HELP.as_bytes()).await?,
            ReplCommand::List => out.write_all(render_list(deck).as_bytes()).await?,
            ReplCommand::Home => deck.go_home(),
            ReplCommand::Open(n) => {
                let id = deck.state().entities().get(n - 1).map(|e| e.id);
                match id {
                    Some(id) => {
                        if let Err(e) = deck.select(id) {
                            out.write_all(format!("! {}\n", e).as_bytes()).await?;
                        }
                    }
                    None => out.write_all(format!("No agent #{}\n", n).as_bytes()).await?,
                }
            }
            ReplCommand::History => {
                let text = match deck.state().selected_entity() {
                    Some(entity) => render_history(entity),
                    None => "No conversation open.\n".to_string(),
                };
                out.write_all(text.as_bytes()).await?;
            }
            ReplCommand::Unknown(cmd) => {
                out.write_all(format!("Unknown command: {} (try /help)\n", cmd).as_bytes())
                    .await?;
            }
            ReplCommand::Text(text) => match deck.state().view() {
                View::Home => create_agent(deck, &text, &mut out).await?,
                View::Chat => chat(deck, text, &mut out).await?,
            },
        }
    }

    out.flush().await
}

async fn create_agent<B, W>(deck: &mut AgentDeck<B>, prompt: &str, out: &mut W) -> std::io::Result<()>
where
    B: AgentBackend,
    W: AsyncWrite + Unpin,
{
    let text = match deck.submit_prompt(prompt).await {
        Some(_) => match deck.state().selected_entity() {
            Some(entity) => format!(
                "Created {}. Say something to it, or /home to go back.\n",
                entity.display_name
            ),
            None => String::new(),
        },
        None => unmatched_hint(deck),
    };
    out.write_all(text.as_bytes()).await
}

async fn chat<B, W>(deck: &mut AgentDeck<B>, text: String, out: &mut W) -> std::io::Result<()>
where
    B: AgentBackend,
    W: AsyncWrite + Unpin,
{
    out.write_all("… sending\n".as_bytes()).await?;
    out.flush().await?;

    deck.set_input(text);
    let rendered = match deck.send_input().await {
        Ok(outcome) => {
            let name = deck
                .state()
                .selected_entity()
                .map(|e| e.display_name.clone())
                .unwrap_or_default();
            format!("{}: {}\n", name, outcome.reply.text)
        }
        Err(e) => format!("! {}\n", e),
    };
    out.write_all(rendered.as_bytes()).await
}

fn prompt_label<B: AgentBackend>(deck: &AgentDeck<B>) -> String {
    match deck.state().selected_entity() {
        Some(entity) => format!("[{}]> ", entity.display_name),
        None => "> ".to_string(),
    }
}

fn unmatched_hint<B: AgentBackend>(deck: &AgentDeck<B>) -> String {
    let mut out = String::from("I don't know that kind of agent. Try one of:\n");
    for rule in deck.dispatcher().rules().rules() {
        let example = match rule.kind {
            MatchKind::Prefix => format!("{} ...", rule.phrase),
            MatchKind::Suffix => format!("... {}", rule.phrase),
        };
        out.push_str(&format!("  {:<28} -> {}\n", example, rule.category.display_name()));
    }
    out
}

pub fn render_list<B: AgentBackend>(deck: &AgentDeck<B>) -> String {
    let state = deck.state();
    if state.entities().is_empty() {
        return "No agents yet.\n".to_string();
    }
    let selected = state.selected();
    state
        .entities()
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let marker = if Some(e.id) == selected { "*" } else { " " };
            format!(
                "{}{:>3}. {} [{}] {} message(s)\n",
                marker,
                i + 1,
                e.display_name,
                e.category,
                e.messages.len()
            )
        })
        .collect()
}

pub fn render_history(entity: &Entity) -> String {
    if entity.messages.is_empty() {
        return format!("{}: no messages yet.\n", entity.display_name);
    }
    entity
        .messages
        .iter()
        .map(|m| render_message(entity, m))
        .collect()
}

fn render_message(entity: &Entity, message: &Message) -> String {
    let who = match message.origin {
        MessageOrigin::User => "you",
        MessageOrigin::Entity => entity.display_name.as_str(),
    };
    format!(
        "[{}] {}: {}\n",
        message.created_at.to_datetime().format("%H:%M:%S"),
        who,
        message.text
    )
}
