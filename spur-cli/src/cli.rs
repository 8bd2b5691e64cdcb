use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::SpurConfig;
use crate::{commands, error::CliError};

#[derive(Debug, Parser)]
#[command(name = "spurchat")]
#[command(about = "Chat with a Spur workflow from the terminal")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Spur server API base URL (overrides the config file)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Interactive chat session with a workflow
    Chat {
        /// Workflow answering the chat
        #[arg(short, long)]
        workflow: Option<String>,

        /// Resume an existing session
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Send one message and print the reply
    Ask {
        /// Message to send
        message: String,

        /// Workflow answering the chat
        #[arg(short, long)]
        workflow: Option<String>,

        /// Session to continue
        #[arg(short, long)]
        session: Option<String>,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the status of a workflow run
    Status {
        /// Run id returned when the run was started
        run_id: String,

        /// Print the raw status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that the Spur server is reachable
    Health,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Show version information
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Print the configuration file path
    Path,
}

impl Cli {
    pub async fn run(&self) -> Result<(), CliError> {
        match &self.command {
            Some(Commands::Chat { workflow, session }) => {
                let config = self.load_config()?;
                commands::run_chat(&config, workflow.as_deref(), session.as_deref()).await
            }
            Some(Commands::Ask {
                message,
                workflow,
                session,
                json,
            }) => {
                let config = self.load_config()?;
                commands::ask(&config, message, workflow.as_deref(), session.as_deref(), *json)
                    .await
            }
            Some(Commands::Status { run_id, json }) => {
                let config = self.load_config()?;
                commands::show_run_status(&config, run_id, *json).await
            }
            Some(Commands::Health) => {
                let config = self.load_config()?;
                commands::check_health(&config).await
            }
            Some(Commands::Config { action }) => {
                let (config, path) = self.load_config_with_path()?;
                commands::handle_config_command(action, &config, &path)
            }
            Some(Commands::Version) => self.handle_version(),
            None => {
                println!("spurchat - chat with a Spur workflow");
                println!("Run 'spurchat --help' for usage information.");
                Ok(())
            }
        }
    }

    fn load_config(&self) -> Result<SpurConfig, CliError> {
        self.load_config_with_path().map(|(config, _)| config)
    }

    /// Config file and environment, then command-line overrides
    fn load_config_with_path(&self) -> Result<(SpurConfig, PathBuf), CliError> {
        let (mut config, path) = SpurConfig::load(self.config.as_deref())?;
        if let Some(base_url) = &self.base_url {
            config.server.base_url = base_url.clone();
        }
        Ok((config, path))
    }

    fn handle_version(&self) -> Result<(), CliError> {
        println!("spurchat version: {}", env!("CARGO_PKG_VERSION"));
        println!("Author: {}", env!("CARGO_PKG_AUTHORS"));
        println!("Description: {}", env!("CARGO_PKG_DESCRIPTION"));
        Ok(())
    }
}
