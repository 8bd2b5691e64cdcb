use serde::Serialize;
use spur_types::ChatMessage;

/// Result of one chat turn, as seen by the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ChatOutcome {
    /// The workflow produced an assistant reply
    Reply(ChatMessage),
    /// The turn failed; `reply` is still displayable
    Failed { reply: ChatMessage, error: String },
    /// Superseded by a later `execute` or stopped by `cleanup`
    Cancelled,
}

impl ChatOutcome {
    pub fn reply_with(message: impl Into<String>) -> Self {
        Self::Reply(ChatMessage::assistant(message))
    }

    pub fn failed(error: impl Into<String>, reply: impl Into<String>) -> Self {
        Self::Failed {
            reply: ChatMessage::assistant(reply),
            error: error.into(),
        }
    }

    /// The message to render, if any
    pub fn message(&self) -> Option<&ChatMessage> {
        match self {
            Self::Reply(message) | Self::Failed { reply: message, .. } => Some(message),
            Self::Cancelled => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn is_reply(&self) -> bool {
        matches!(self, Self::Reply(_))
    }
}
