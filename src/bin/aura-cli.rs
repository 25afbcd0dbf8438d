//! Interactive terminal client for the Aura chat backend.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;

use aura_chat::api::AuraClient;
use aura_chat::error::ChatError;
use aura_chat::session::{ChatSession, SessionEvent};
use aura_chat::settings::Settings;
use aura_chat::store::{FileStore, StateStore};

#[derive(Parser, Debug)]
#[command(
    name = "aura-cli",
    about = "Interactive terminal client for the Aura chat backend"
)]
struct CliArgs {
    /// Base URL of the backend; overrides the saved preference.
    #[arg(long)]
    base_url: Option<String>,
    /// Use the non-streaming endpoint and print replies in one piece.
    #[arg(long)]
    buffered: bool,
    /// Request timeout in seconds for non-streaming calls.
    #[arg(long, default_value_t = 30)]
    timeout: u64,
    /// Keep no on-disk state for this run.
    #[arg(long)]
    ephemeral: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = CliArgs::parse();

    let store = if args.ephemeral {
        StateStore::in_memory()
    } else {
        match FileStore::open() {
            Ok(file) => StateStore::new(Arc::new(file)),
            Err(err) => {
                log::warn!("falling back to in-memory state: {err}");
                StateStore::in_memory()
            }
        }
    };

    let settings = Settings::load(&store);
    let base_url = args.base_url.clone().unwrap_or(settings.api_url);

    let client = Arc::new(AuraClient::new(base_url.clone(), Some(args.timeout)));
    let session = ChatSession::new(client, store);

    match session.health().await {
        Ok(health) if health.ai_model_ready => println!("Connected to {base_url}."),
        Ok(_) => println!("Connected to {base_url}, but the model is not ready yet."),
        Err(err) => println!("Warning: backend at {base_url} is unreachable: {err}"),
    }
    if let Err(err) = session.refresh_conversations().await {
        log::debug!("initial conversation refresh failed: {err}");
    }
    println!("Commands: /new, /list, /load <n>, /history, /quit");

    loop {
        print!("aura> ");
        io::stdout().flush().context("flush prompt")?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line).context("read input")? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            "/quit" | "/exit" => break,
            "/new" => {
                session.start_new();
                println!("Started a new conversation.");
            }
            "/list" => list_conversations(&session).await,
            "/history" => print_transcript(&session),
            _ if line.starts_with("/load") => load_conversation(&session, line).await,
            _ if line.starts_with('/') => println!("Unknown command: {line}"),
            _ => {
                if let Err(err) = run_exchange(&session, line, args.buffered).await {
                    println!("{err}");
                }
            }
        }
    }

    Ok(())
}

/// Submit one message and print the reply as its fragments arrive.
async fn run_exchange(
    session: &ChatSession,
    line: &str,
    buffered: bool,
) -> Result<(), ChatError> {
    let mut events = session.subscribe();
    let printer = tokio::spawn(async move {
        let mut printed = 0;
        loop {
            match events.recv().await {
                Ok(SessionEvent::AssistantUpdated { content, .. }) => {
                    // Content only grows, except when a failure notice
                    // replaces it wholesale.
                    let delta = content.get(printed..).unwrap_or(content.as_str());
                    print!("{delta}");
                    let _ = io::stdout().flush();
                    printed = content.len();
                }
                Ok(SessionEvent::StreamingChanged(false)) => {
                    println!();
                    break;
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
        }
    });

    let result = if buffered {
        session.submit_buffered(line).await
    } else {
        session.submit(line).await
    };

    // A rejected submit emits nothing, so the printer would wait forever.
    if result.is_err() {
        printer.abort();
    } else {
        let _ = printer.await;
    }
    result
}

async fn list_conversations(session: &ChatSession) {
    if let Err(err) = session.refresh_conversations().await {
        log::warn!("conversation refresh failed, showing cached list: {err}");
    }

    let conversations = session.conversations();
    if conversations.is_empty() {
        println!("No conversations yet.");
        return;
    }
    for (index, summary) in conversations.iter().enumerate() {
        println!(
            "{:>3}. {} ({} messages)",
            index + 1,
            summary.title,
            summary.messages_count
        );
    }
}

async fn load_conversation(session: &ChatSession, line: &str) {
    let argument = line.strip_prefix("/load").unwrap_or_default().trim();
    let slot = match argument.parse::<usize>().ok().and_then(|n| n.checked_sub(1)) {
        Some(slot) => slot,
        None => {
            println!("Usage: /load <number>");
            return;
        }
    };

    let Some(summary) = session.conversations().get(slot).cloned() else {
        println!("No such conversation.");
        return;
    };

    match session.load(&summary.id).await {
        Ok(()) => print_transcript(session),
        Err(err) => println!("Could not load conversation: {err}"),
    }
}

fn print_transcript(session: &ChatSession) {
    let transcript = session.transcript();
    if transcript.is_empty() {
        println!("The transcript is empty.");
        return;
    }
    for message in transcript {
        println!("{}: {}", message.role, message.content);
    }
}
