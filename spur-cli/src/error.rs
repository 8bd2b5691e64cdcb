use std::fmt;

use spur_chat::ChatError;
use spur_sdk::SdkError;

/// Main error type for the spurchat CLI
#[derive(Debug)]
pub enum CliError {
    /// Configuration-related errors
    Config(String),
    /// File and terminal I/O errors
    Io(std::io::Error),
    /// A chat turn resolved to a failure outcome
    Workflow(String),
    /// Command execution errors
    Command(String),
    /// Communication with the Spur server
    Communication(String),
    /// Generic errors from anyhow
    Other(anyhow::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Workflow(msg) => write!(f, "Workflow error: {msg}"),
            CliError::Command(msg) => write!(f, "Command error: {msg}"),
            CliError::Communication(msg) => write!(f, "Communication error: {msg}"),
            CliError::Other(err) => write!(f, "Error: {err}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Io(err) => Some(err),
            CliError::Other(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl CliError {
    /// Get the exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 2,
            CliError::Io(_) => 3,
            CliError::Workflow(_) => 4,
            CliError::Command(_) => 5,
            CliError::Communication(_) => 7,
            CliError::Other(_) => 1,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io(err)
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::Other(err)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Other(err.into())
    }
}

impl From<toml::ser::Error> for CliError {
    fn from(err: toml::ser::Error) -> Self {
        CliError::Other(err.into())
    }
}

impl From<config::ConfigError> for CliError {
    fn from(err: config::ConfigError) -> Self {
        CliError::Config(err.to_string())
    }
}

impl From<ChatError> for CliError {
    fn from(err: ChatError) -> Self {
        CliError::Config(err.to_string())
    }
}

impl From<SdkError> for CliError {
    fn from(err: SdkError) -> Self {
        match err {
            SdkError::Authentication { .. } | SdkError::InvalidRequest { .. } => {
                CliError::Command(err.to_string())
            }
            _ => CliError::Communication(err.to_string()),
        }
    }
}
