//! Turning a terminal run snapshot into a chat reply.

use serde_json::Value;
use spur_types::{NodeOutputs, RunState, RunStatusResponse, TaskState};
use tracing::{debug, error, warn};

use crate::outcome::ChatOutcome;

pub const NO_WORKFLOW_CONNECTED: &str = "No workflow connected";
pub const START_FAILED_FALLBACK: &str = "Failed to execute workflow";
pub const STATUS_QUERY_FAILED: &str = "Error checking workflow status";
pub const NO_OUTPUT_NODE: &str = "No output node found in workflow";
pub const WORKFLOW_FAILED_FALLBACK: &str = "Workflow execution failed";
pub const WORKFLOW_CANCELED: &str = "Workflow run was canceled";
pub const NO_RESPONSE_GENERATED: &str = "Workflow completed but no response was generated";
pub const POLL_TIMED_OUT: &str = "Timed out waiting for workflow response";

pub const APOLOGY_REPLY: &str = "Sorry, an error occurred while processing your message.";
pub const NO_RESPONSE_REPLY: &str = "Sorry, I couldn't generate a response.";

/// Output field chat workflows put the assistant's answer in
pub const ASSISTANT_MESSAGE_FIELD: &str = "assistant_message";

pub fn error_reply(error: &str) -> String {
    format!("Error: {}", error)
}

/// Resolve a snapshot whose status is terminal
pub fn resolve_terminal_status(status: &RunStatusResponse) -> ChatOutcome {
    let Some(output_node) = status.definition().output_node() else {
        error!("Run {}: {}", status.id, NO_OUTPUT_NODE);
        return ChatOutcome::failed(NO_OUTPUT_NODE, error_reply(NO_OUTPUT_NODE));
    };

    let output = status.tasks.iter().find_map(|task| {
        if task.node_id == output_node.id && task.status == TaskState::Completed {
            task.non_empty_outputs()
        } else {
            None
        }
    });

    if let Some(outputs) = output {
        debug!("Run {} produced output on node {}", status.id, output_node.id);
        return ChatOutcome::reply_with(output_text(outputs));
    }

    match status.status {
        RunState::Failed | RunState::Canceled => {
            let fallback = if status.status == RunState::Canceled {
                WORKFLOW_CANCELED
            } else {
                WORKFLOW_FAILED_FALLBACK
            };
            let error = status
                .first_task_with_status(TaskState::Failed)
                .and_then(|task| task.error.as_deref())
                .filter(|message| !message.is_empty())
                .unwrap_or(fallback);

            warn!("Run {} ended {}: {}", status.id, status.status, error);
            ChatOutcome::failed(error, error_reply(error))
        }
        _ => {
            warn!("Run {}: {}", status.id, NO_RESPONSE_GENERATED);
            ChatOutcome::failed(NO_RESPONSE_GENERATED, NO_RESPONSE_REPLY)
        }
    }
}

/// `assistant_message` when present and non-empty, otherwise the whole outputs as JSON
fn output_text(outputs: &NodeOutputs) -> String {
    match outputs.get(ASSISTANT_MESSAGE_FIELD) {
        Some(Value::String(text)) if !text.is_empty() => text.clone(),
        Some(value) if is_present(value) => value.to_string(),
        _ => Value::Object(outputs.clone()).to_string(),
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(text) => !text.is_empty(),
        Value::Number(number) => number.as_f64() != Some(0.0),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(status: &str, nodes: Value, tasks: Value) -> RunStatusResponse {
        serde_json::from_value(json!({
            "id": "R1",
            "status": status,
            "tasks": tasks,
            "workflow_version": {"definition": {"nodes": nodes}}
        }))
        .unwrap()
    }

    fn chat_nodes() -> Value {
        json!([
            {"id": "input_node", "node_type": "InputNode"},
            {"id": "output_node", "node_type": "OutputNode"}
        ])
    }

    #[test]
    fn test_assistant_message_is_the_reply() {
        let status = snapshot(
            "COMPLETED",
            chat_nodes(),
            json!([{"node_id": "output_node", "status": "COMPLETED", "outputs": {"assistant_message": "Hi"}}]),
        );
        assert_eq!(resolve_terminal_status(&status), ChatOutcome::reply_with("Hi"));
    }

    #[test]
    fn test_outputs_without_assistant_message_are_serialized() {
        let status = snapshot(
            "COMPLETED",
            chat_nodes(),
            json!([{"node_id": "output_node", "status": "COMPLETED", "outputs": {"foo": 1}}]),
        );
        assert_eq!(
            resolve_terminal_status(&status),
            ChatOutcome::reply_with(r#"{"foo":1}"#)
        );
    }

    #[test]
    fn test_structured_assistant_message_is_serialized() {
        let status = snapshot(
            "COMPLETED",
            chat_nodes(),
            json!([{"node_id": "output_node", "status": "COMPLETED", "outputs": {"assistant_message": {"text": "Hi"}}}]),
        );
        assert_eq!(
            resolve_terminal_status(&status),
            ChatOutcome::reply_with(r#"{"text":"Hi"}"#)
        );
    }

    #[test]
    fn test_empty_assistant_message_falls_back_to_outputs() {
        let status = snapshot(
            "COMPLETED",
            chat_nodes(),
            json!([{"node_id": "output_node", "status": "COMPLETED", "outputs": {"assistant_message": ""}}]),
        );
        assert_eq!(
            resolve_terminal_status(&status),
            ChatOutcome::reply_with(r#"{"assistant_message":""}"#)
        );
    }

    #[test]
    fn test_failed_task_error_is_surfaced() {
        let status = snapshot(
            "FAILED",
            chat_nodes(),
            json!([
                {"node_id": "input_node", "status": "COMPLETED", "outputs": {"user_message": "x"}},
                {"node_id": "llm", "status": "FAILED", "error": "boom"}
            ]),
        );
        let outcome = resolve_terminal_status(&status);
        assert_eq!(outcome, ChatOutcome::failed("boom", "Error: boom"));
    }

    #[test]
    fn test_failed_without_task_error_uses_fallback() {
        let status = snapshot("FAILED", chat_nodes(), json!([]));
        assert_eq!(
            resolve_terminal_status(&status).error(),
            Some(WORKFLOW_FAILED_FALLBACK)
        );
    }

    #[test]
    fn test_canceled_run() {
        let status = snapshot("CANCELED", chat_nodes(), json!([]));
        let outcome = resolve_terminal_status(&status);
        assert_eq!(outcome.error(), Some(WORKFLOW_CANCELED));
        assert_eq!(
            outcome.message().unwrap().message,
            "Error: Workflow run was canceled"
        );
    }

    #[test]
    fn test_missing_output_node_wins_regardless_of_status() {
        for state in ["COMPLETED", "FAILED"] {
            let status = snapshot(
                state,
                json!([{"id": "input_node", "node_type": "InputNode"}]),
                json!([{"node_id": "input_node", "status": "FAILED", "error": "boom"}]),
            );
            let outcome = resolve_terminal_status(&status);
            assert_eq!(outcome.error(), Some(NO_OUTPUT_NODE));
            assert_eq!(
                outcome.message().unwrap().message,
                "Error: No output node found in workflow"
            );
        }
    }

    #[test]
    fn test_completed_without_output_task() {
        let status = snapshot(
            "COMPLETED",
            chat_nodes(),
            json!([{"node_id": "output_node", "status": "RUNNING"}]),
        );
        assert_eq!(
            resolve_terminal_status(&status),
            ChatOutcome::failed(NO_RESPONSE_GENERATED, NO_RESPONSE_REPLY)
        );
    }

    #[test]
    fn test_output_task_with_empty_outputs_does_not_count() {
        let status = snapshot(
            "COMPLETED",
            chat_nodes(),
            json!([{"node_id": "output_node", "status": "COMPLETED", "outputs": {}}]),
        );
        assert_eq!(
            resolve_terminal_status(&status).error(),
            Some(NO_RESPONSE_GENERATED)
        );
    }
}
