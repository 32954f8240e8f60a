//! Contextual chat CLI
//!
//! Run with: cargo run -p contextual-chat -- ask "What does the URL context tool do?"

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use contextual_chat::citation::format_source_list;
use contextual_chat::{ChatConfig, ChatSession, ChatStore, GeminiClient, KnowledgeBase, MessageSender};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "contextual-chat")]
#[command(version, about = "Chat with web pages using URL-grounded answers and citations")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the data directory
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage knowledge base groups
    Groups {
        #[command(subcommand)]
        command: GroupCommands,
    },
    /// Manage the URLs of a group
    Urls {
        #[command(subcommand)]
        command: UrlCommands,
    },
    /// Ask a question about the active group's URLs
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },
    /// Suggest questions for the active group
    Suggest,
    /// Show the active group's conversation
    History,
    /// Clear the active group's conversation
    Clear,
}

#[derive(Subcommand)]
enum GroupCommands {
    /// List groups and their URLs
    List,
    /// Create a group and make it active
    Add { name: String },
    /// Make a group active (by id or name)
    Select { group: String },
    /// Delete an editable group (by id or name)
    Delete { group: String },
}

#[derive(Subcommand)]
enum UrlCommands {
    /// Add a URL to a group
    Add {
        url: String,
        /// Target group (defaults to the active one)
        #[arg(short, long)]
        group: Option<String>,
    },
    /// Remove a URL from a group
    Remove {
        url: String,
        /// Target group (defaults to the active one)
        #[arg(short, long)]
        group: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "contextual_chat=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = ChatConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = dir;
    }

    let store = ChatStore::new(&config.storage.data_dir);
    let mut kb = store.load_knowledge_base();
    let mut conversations = store.load_conversations();
    tracing::debug!("Using data directory {}", store.data_dir().display());

    match cli.command {
        Commands::Groups { command } => {
            run_group_command(&mut kb, command)?;
        }
        Commands::Urls { command } => {
            run_url_command(&mut kb, command)?;
        }
        Commands::Ask { prompt } => {
            let client = GeminiClient::new(&config.gemini)?;
            let mut session = ChatSession::new(Arc::new(client), kb, conversations);

            let group = session
                .knowledge()
                .active_group()
                .ok_or_else(|| anyhow!("No active URL group. Create one with `groups add`."))?;
            if group.urls.is_empty() {
                tracing::warn!("Group '{}' has no URLs; answering without URL context", group.name);
            }

            // Progress goes to stderr; the cited answer is printed once at the end.
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
            spinner.enable_steady_tick(Duration::from_millis(120));
            spinner.set_message("Waiting for answer...");

            let mut received = 0usize;
            let answer = session
                .send_message(&prompt.join(" "), |delta| {
                    received += delta.chars().count();
                    spinner.set_message(format!("Receiving answer ({} chars)", received));
                })
                .await;
            spinner.finish_and_clear();

            if let Some(answer) = answer {
                if answer.is_error {
                    eprintln!("Error: {}", answer.text);
                } else {
                    println!("{}", answer.text);
                    if !answer.url_context.is_empty() {
                        println!("\n{}", format_source_list(&answer.url_context));
                    }
                }
            }

            (kb, conversations) = session.into_parts();
        }
        Commands::Suggest => {
            let client = GeminiClient::new(&config.gemini)?;
            let session = ChatSession::new(Arc::new(client), kb, conversations);
            for suggestion in session.suggestions().await {
                println!("- {}", suggestion);
            }
            (kb, conversations) = session.into_parts();
        }
        Commands::History => {
            let Some(group) = kb.active_group() else {
                println!("No active URL group.");
                return Ok(());
            };
            for message in conversations.messages(&group.id) {
                let who = match message.sender {
                    MessageSender::User => "you",
                    MessageSender::Model => "model",
                    MessageSender::System => "system",
                };
                let time = chrono::DateTime::parse_from_rfc3339(&message.timestamp)
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|_| message.timestamp.clone());
                println!("[{}] {}: {}", time, who, message.text);
                if !message.url_context.is_empty() {
                    println!("{}", format_source_list(&message.url_context));
                }
            }
        }
        Commands::Clear => {
            if let Some(group) = kb.active_group() {
                let id = group.id.clone();
                if conversations.clear(&id) {
                    println!("Cleared conversation for '{}'", group.name);
                }
            }
        }
    }

    store.save_knowledge_base(&kb)?;
    store.save_conversations(&mut conversations, &kb)?;
    Ok(())
}

fn run_group_command(kb: &mut KnowledgeBase, command: GroupCommands) -> anyhow::Result<()> {
    match command {
        GroupCommands::List => {
            let active = kb.active_group().map(|g| g.id.clone());
            for group in kb.groups() {
                let marker = if active.as_deref() == Some(group.id.as_str()) { "*" } else { " " };
                let lock = if group.is_editable { "" } else { " (read-only)" };
                println!("{} {} [{}]{}", marker, group.name, group.id, lock);
                for url in &group.urls {
                    println!("    {}", url);
                }
            }
        }
        GroupCommands::Add { name } => {
            let group = kb.add_group(&name)?;
            println!("Created group '{}' [{}]", group.name, group.id);
        }
        GroupCommands::Select { group } => {
            let id = resolve_group(kb, Some(&group))?;
            kb.select_group(&id)?;
            println!("Active group: {}", group);
        }
        GroupCommands::Delete { group } => {
            let id = resolve_group(kb, Some(&group))?;
            let removed = kb.delete_group(&id)?;
            println!("Deleted group '{}'", removed.name);
        }
    }
    Ok(())
}

fn run_url_command(kb: &mut KnowledgeBase, command: UrlCommands) -> anyhow::Result<()> {
    match command {
        UrlCommands::Add { url, group } => {
            let id = resolve_group(kb, group.as_deref())?;
            kb.add_url(&id, &url)?;
            println!("Added {}", url.trim());
        }
        UrlCommands::Remove { url, group } => {
            let id = resolve_group(kb, group.as_deref())?;
            if kb.remove_url(&id, &url)? {
                println!("Removed {}", url);
            } else {
                println!("{} was not in the group", url);
            }
        }
    }
    Ok(())
}

fn resolve_group(kb: &KnowledgeBase, group: Option<&str>) -> anyhow::Result<String> {
    let found = match group {
        Some(name) => kb.find(name),
        None => kb.active_group(),
    };
    found
        .map(|g| g.id.clone())
        .ok_or_else(|| anyhow!("URL group not found: {}", group.unwrap_or("<active>")))
}
