//! Interactive chat loop

use std::io::Write;

use spur_chat::ChatOutcome;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use super::build_poller;
use crate::config::SpurConfig;
use crate::error::CliError;

const HELP: &str = "Commands: /session shows the session id, /reset starts a new session, /quit exits";

#[derive(Debug, PartialEq, Eq)]
pub enum ReplInput<'a> {
    Empty,
    Message(&'a str),
    Session,
    Reset,
    Quit,
    Help,
    Unknown(&'a str),
}

impl<'a> ReplInput<'a> {
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ReplInput::Empty;
        }
        if !line.starts_with('/') {
            return ReplInput::Message(line);
        }
        match line {
            "/session" => ReplInput::Session,
            "/reset" => ReplInput::Reset,
            "/quit" | "/exit" => ReplInput::Quit,
            "/help" => ReplInput::Help,
            other => ReplInput::Unknown(other),
        }
    }
}

/// Print the displayable part of an outcome
pub fn print_outcome(outcome: &ChatOutcome) {
    if let Some(message) = outcome.message() {
        println!("{}", message.message);
    }
}

pub async fn run_chat(
    config: &SpurConfig,
    workflow: Option<&str>,
    session: Option<&str>,
) -> Result<(), CliError> {
    let poller = build_poller(config, workflow, session)?;
    if poller.workflow_id().is_none() {
        warn!("No workflow configured; pass --workflow or set chat.workflow_id");
    }

    info!("Chatting against {}", config.server.base_url);
    println!("Session {}", poller.session_id());
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match ReplInput::parse(&line) {
            ReplInput::Empty => continue,
            ReplInput::Quit => break,
            ReplInput::Help => println!("{}", HELP),
            ReplInput::Session => println!("{}", poller.session_id()),
            ReplInput::Reset => println!("New session {}", poller.reset_session()),
            ReplInput::Unknown(command) => println!("Unknown command {}. {}", command, HELP),
            ReplInput::Message(message) => {
                tokio::select! {
                    outcome = poller.execute(message) => print_outcome(&outcome),
                    _ = tokio::signal::ctrl_c() => {
                        poller.cleanup();
                        println!("(cancelled)");
                    }
                }
                poller.acknowledge();
            }
        }
    }

    poller.cleanup();
    Ok(())
}
