//! Run status inspection

use spur_types::RunStatusResponse;

use crate::config::SpurConfig;
use crate::error::CliError;

pub async fn show_run_status(config: &SpurConfig, run_id: &str, json: bool) -> Result<(), CliError> {
    let client = config.client()?;
    let status = client.fetch_run_status(run_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print!("{}", format_status(&status));
    }
    Ok(())
}

fn format_status(status: &RunStatusResponse) -> String {
    let mut out = format!("Run {}: {}\n", status.id, status.status);
    if let Some(workflow_id) = &status.workflow_id {
        out.push_str(&format!("Workflow: {}\n", workflow_id));
    }
    for task in &status.tasks {
        out.push_str(&format!("  {} {:?}", task.node_id, task.status));
        if let Some(error) = &task.error {
            out.push_str(&format!(" ({})", error));
        }
        out.push('\n');
    }
    out
}
