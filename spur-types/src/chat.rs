use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;

use crate::run::RunInputs;

/// Name of the input node every chat workflow exposes
pub const CHAT_INPUT_NODE: &str = "input_node";

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single chat turn, as rendered by the front end and sent back as history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChatMessage {
    pub role: Role,
    pub message: String,
}

impl ChatMessage {
    pub fn new(role: Role, message: impl Into<String>) -> Self {
        Self {
            role,
            message: message.into(),
        }
    }

    pub fn user(message: impl Into<String>) -> Self {
        Self::new(Role::User, message)
    }

    pub fn assistant(message: impl Into<String>) -> Self {
        Self::new(Role::Assistant, message)
    }
}

/// Fields the chat input node expects for one turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatInputs {
    pub user_message: String,
    pub session_id: String,
    #[serde(default)]
    pub message_history: Vec<ChatMessage>,
}

impl ChatInputs {
    pub fn new(user_message: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            session_id: session_id.into(),
            message_history: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.message_history = history;
        self
    }

    /// Wrap these fields under [`CHAT_INPUT_NODE`] as run inputs
    pub fn into_run_inputs(self) -> RunInputs {
        let history = self
            .message_history
            .into_iter()
            .map(|entry| {
                let mut turn = Map::new();
                turn.insert("role".to_string(), Value::String(entry.role.to_string()));
                turn.insert("message".to_string(), Value::String(entry.message));
                Value::Object(turn)
            })
            .collect();

        let mut fields = Map::new();
        fields.insert("user_message".to_string(), Value::String(self.user_message));
        fields.insert("session_id".to_string(), Value::String(self.session_id));
        fields.insert("message_history".to_string(), Value::Array(history));

        let mut inputs = RunInputs::new();
        inputs.insert(CHAT_INPUT_NODE.to_string(), fields);
        inputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::assistant("Hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","message":"Hi"}"#);
    }

    #[test]
    fn test_chat_inputs_nest_under_input_node() {
        let inputs = ChatInputs::new("hello", "chat_session_1_abc")
            .with_history(vec![ChatMessage::user("earlier"), ChatMessage::assistant("reply")])
            .into_run_inputs();

        let node = inputs.get(CHAT_INPUT_NODE).unwrap();
        assert_eq!(node["user_message"], "hello");
        assert_eq!(node["session_id"], "chat_session_1_abc");
        assert_eq!(
            node["message_history"],
            serde_json::json!([
                {"role": "user", "message": "earlier"},
                {"role": "assistant", "message": "reply"}
            ])
        );
    }

    #[test]
    fn test_empty_history_is_still_sent() {
        let inputs = ChatInputs::new("hello", "s").into_run_inputs();
        assert_eq!(inputs[CHAT_INPUT_NODE]["message_history"], serde_json::json!([]));
    }
}
