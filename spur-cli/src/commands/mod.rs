//! Command implementations for the spurchat CLI

pub mod ask;
pub mod chat;
pub mod config;
pub mod health;
pub mod status;

pub use ask::*;
pub use chat::*;
pub use self::config::*;
pub use health::*;
pub use status::*;

use std::sync::Arc;

use spur_chat::RunPoller;

use crate::config::SpurConfig;
use crate::error::CliError;

/// Poller over the configured server. Flags win over the config file.
pub fn build_poller(
    config: &SpurConfig,
    workflow: Option<&str>,
    session: Option<&str>,
) -> Result<RunPoller, CliError> {
    let client = config.client()?;
    let workflow_id = workflow
        .map(str::to_string)
        .or_else(|| config.chat.workflow_id.clone());
    let session = session.or(config.chat.session_id.as_deref());

    let poller = RunPoller::new(Arc::new(client), config.poller_config())?.with_session_id(session);
    poller.set_workflow_id(workflow_id);
    Ok(poller)
}
