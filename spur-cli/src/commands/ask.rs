//! One-shot chat turn

use serde::Serialize;
use spur_chat::ChatOutcome;

use super::{build_poller, print_outcome};
use crate::config::SpurConfig;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct AskOutput<'a> {
    session_id: String,
    #[serde(flatten)]
    outcome: &'a ChatOutcome,
}

pub async fn ask(
    config: &SpurConfig,
    message: &str,
    workflow: Option<&str>,
    session: Option<&str>,
    json: bool,
) -> Result<(), CliError> {
    let poller = build_poller(config, workflow, session)?;
    let outcome = poller.execute(message).await;

    if json {
        let output = AskOutput {
            session_id: poller.session_id(),
            outcome: &outcome,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_outcome(&outcome);
    }

    outcome_result(&outcome)
}

/// Failed turns still print a reply but exit non-zero
fn outcome_result(outcome: &ChatOutcome) -> Result<(), CliError> {
    match outcome {
        ChatOutcome::Reply(_) => Ok(()),
        ChatOutcome::Failed { error, .. } => Err(CliError::Workflow(error.clone())),
        ChatOutcome::Cancelled => Err(CliError::Command("Chat turn was cancelled".to_string())),
    }
}
