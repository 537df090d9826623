//! Chat command handler.
//!
//! Interactive conversation: loads the documents once, then answers one
//! line of stdin at a time.

use anyhow::Context;
use clap::Args;
use juris_agent::{Role, Session};
use juris_core::config::AppConfig;
use std::io::Write;
use tokio::io::{self, AsyncBufReadExt, BufReader};

const SESSION_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Interactive conversation over the legal documents
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Hide document loading progress
    #[arg(short, long)]
    pub quiet: bool,
}

/// One line of user input.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Empty,
    Exit,
    Clear,
    History,
    Info,
    Help,
    Unknown(&'a str),
    Query(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }

    match line {
        "/exit" | "/quit" => Input::Exit,
        "/clear" => Input::Clear,
        "/history" => Input::History,
        "/info" => Input::Info,
        "/help" => Input::Help,
        cmd if cmd.starts_with('/') => Input::Unknown(cmd),
        query => Input::Query(query),
    }
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing chat command");

        eprintln!("Loading legal documents...");
        let mut session = super::open_session(config, !self.quiet)
            .await
            .context("Error initializing the system")?;

        if let Some(report) = session.load_report() {
            for doc in &report.documents {
                eprintln!("Successfully loaded: {}", doc.name);
            }
        }
        eprintln!("Legal documents loaded successfully! Type /help for commands.");

        let mut lines = BufReader::new(io::stdin()).lines();

        loop {
            print!("> ");
            std::io::stdout().flush().ok();

            let Some(line) = lines
                .next_line()
                .await
                .context("Failed to read from stdin")?
            else {
                break;
            };

            match parse_input(&line) {
                Input::Empty => continue,
                Input::Exit => break,
                Input::Clear => {
                    session.clear_memory();
                    println!("Conversation memory cleared.");
                }
                Input::History => print_history(&session),
                Input::Info => print_info(&session, config),
                Input::Help => print_help(),
                Input::Unknown(cmd) => println!("Unknown command: {} (try /help)", cmd),
                Input::Query(query) => match session.handle_turn(query).await {
                    Ok(turn) => println!("\n{}\n", turn.response),
                    Err(e) => {
                        let message = format!("Error processing your request: {}", e);
                        tracing::error!("{}", message);
                        println!("{}", message);
                    }
                },
            }
        }

        tracing::info!(
            session = %session.id(),
            turns = session.transcript().len() / 2,
            "Chat ended"
        );
        Ok(())
    }
}

fn print_history(session: &Session) {
    if session.transcript().is_empty() {
        println!("No messages yet.");
        return;
    }

    for entry in session.transcript() {
        let speaker = match entry.role {
            Role::User => "You",
            Role::Assistant => "Assistant",
        };
        println!(
            "[{}] {}: {}",
            entry.at.format(SESSION_TIME_FORMAT),
            speaker,
            entry.content
        );
    }
}

fn print_info(session: &Session, config: &AppConfig) {
    println!("Session Info");
    println!("- User: {}", session.settings().user);
    println!("- Date: {} UTC", chrono::Utc::now().format(SESSION_TIME_FORMAT));
    println!("- Session: {}", session.id());
    println!("- Model: {} ({})", config.model, config.provider);
    println!(
        "- Memory: {}/{} interactions",
        session.memory().len(),
        session.memory().capacity()
    );

    println!("Available Legal Documents");
    for (i, doc) in config.documents.iter().enumerate() {
        println!("{}. {}", i + 1, doc.name);
    }

    if session.is_loaded() {
        println!("Documents loaded and ready!");
    } else {
        println!("Documents not loaded.");
    }
}

fn print_help() {
    println!("/clear    forget earlier questions");
    println!("/history  show the conversation so far");
    println!("/info     session and document information");
    println!("/exit     leave (also /quit)");
}
