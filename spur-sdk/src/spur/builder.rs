use serde_json::Value;
use spur_types::{ChatInputs, RunInputs, RunMode, StartRunRequest, StartRunResponse};

use crate::{error::SdkError, spur::client::SpurClient};

/// Builder for starting a workflow run
pub struct RunBuilder<'a> {
    client: &'a SpurClient,
    workflow_id: String,
    inputs: RunInputs,
    run_mode: RunMode,
    parent_run_id: Option<String>,
}

impl<'a> RunBuilder<'a> {
    /// Create a new run builder
    pub fn new(client: &'a SpurClient, workflow_id: impl Into<String>) -> Self {
        Self {
            client,
            workflow_id: workflow_id.into(),
            inputs: RunInputs::new(),
            run_mode: RunMode::Interactive,
            parent_run_id: None,
        }
    }

    /// Set one input field of one node
    pub fn input(
        mut self,
        node: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.inputs
            .entry(node.into())
            .or_default()
            .insert(field.into(), value.into());
        self
    }

    /// Replace all inputs with the fields of a chat turn
    pub fn chat_inputs(mut self, inputs: ChatInputs) -> Self {
        self.inputs = inputs.into_run_inputs();
        self
    }

    pub fn run_mode(mut self, run_mode: RunMode) -> Self {
        self.run_mode = run_mode;
        self
    }

    pub fn parent_run_id(mut self, parent_run_id: impl Into<String>) -> Self {
        self.parent_run_id = Some(parent_run_id.into());
        self
    }

    /// Assemble the request without sending it
    pub fn build(self) -> Result<StartRunRequest, SdkError> {
        if self.workflow_id.is_empty() {
            return Err(SdkError::invalid_request("workflow_id must be specified"));
        }

        Ok(StartRunRequest {
            workflow_id: self.workflow_id,
            run_mode: self.run_mode,
            initial_inputs: self.inputs,
            parent_run_id: self.parent_run_id,
        })
    }

    /// Send the request
    pub async fn send(self) -> Result<StartRunResponse, SdkError> {
        let client = self.client;
        let request = self.build()?;
        client.create_run(&request).await
    }
}

impl SpurClient {
    /// Start building a run of `workflow_id`
    pub fn run_builder(&self, workflow_id: impl Into<String>) -> RunBuilder<'_> {
        RunBuilder::new(self, workflow_id)
    }
}
