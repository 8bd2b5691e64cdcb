use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;

/// Node type marking the node whose task outputs are the workflow's result
pub const OUTPUT_NODE_TYPE: &str = "OutputNode";

/// Field values produced by a single node
pub type NodeOutputs = Map<String, Value>;

/// Initial inputs of a run: node name -> field -> value
pub type RunInputs = BTreeMap<String, Map<String, Value>>;

/// How the backend should schedule a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum RunMode {
    Batch,
    /// Keeps the run responsive to status polling from a UI
    #[default]
    Interactive,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Batch => "batch",
            RunMode::Interactive => "interactive",
        }
    }
}

/// Overall state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum RunState {
    Pending,
    Running,
    Completed,
    Failed,
    /// Waiting on human input; the run resumes later
    Paused,
    Canceled,
}

impl RunState {
    /// Whether polling can stop at this state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::Failed | RunState::Canceled
        )
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RunState::Pending => "PENDING",
            RunState::Running => "RUNNING",
            RunState::Completed => "COMPLETED",
            RunState::Failed => "FAILED",
            RunState::Paused => "PAUSED",
            RunState::Canceled => "CANCELED",
        };
        f.write_str(label)
    }
}

/// State of a single node execution within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum TaskState {
    Pending,
    Running,
    Completed,
    Failed,
    Paused,
    Canceled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub node_id: String,
    pub status: TaskState,
    #[serde(default)]
    pub outputs: Option<NodeOutputs>,
    #[serde(default)]
    pub error: Option<String>,
}

impl Task {
    /// Outputs, when the task produced at least one field
    pub fn non_empty_outputs(&self) -> Option<&NodeOutputs> {
        self.outputs.as_ref().filter(|outputs| !outputs.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    pub id: String,
    pub node_type: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub config: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowLink {
    pub source_id: String,
    pub target_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub links: Vec<WorkflowLink>,
}

impl WorkflowDefinition {
    /// First node of the designated output type
    pub fn output_node(&self) -> Option<&WorkflowNode> {
        self.nodes
            .iter()
            .find(|node| node.node_type == OUTPUT_NODE_TYPE)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowVersion {
    #[serde(default)]
    pub definition: WorkflowDefinition,
}

/// Snapshot returned by one status query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatusResponse {
    pub id: String,
    #[serde(default)]
    pub workflow_id: Option<String>,
    pub status: RunState,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub workflow_version: WorkflowVersion,
}

impl RunStatusResponse {
    pub fn definition(&self) -> &WorkflowDefinition {
        &self.workflow_version.definition
    }

    pub fn first_task_with_status(&self, status: TaskState) -> Option<&Task> {
        self.tasks.iter().find(|task| task.status == status)
    }
}

/// Request body for starting a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartRunRequest {
    /// Carried in the URL path, not the body
    #[serde(skip)]
    pub workflow_id: String,
    /// Carried as the `run_type` query parameter
    #[serde(skip)]
    pub run_mode: RunMode,
    pub initial_inputs: RunInputs,
    pub parent_run_id: Option<String>,
}

impl StartRunRequest {
    pub fn new(workflow_id: impl Into<String>, initial_inputs: RunInputs) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            run_mode: RunMode::default(),
            initial_inputs,
            parent_run_id: None,
        }
    }

    pub fn with_run_mode(mut self, run_mode: RunMode) -> Self {
        self.run_mode = run_mode;
        self
    }

    pub fn with_parent_run_id(mut self, parent_run_id: impl Into<String>) -> Self {
        self.parent_run_id = Some(parent_run_id.into());
        self
    }
}

/// Handle for a started run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartRunResponse {
    pub id: String,
    #[serde(default)]
    pub workflow_id: Option<String>,
    #[serde(default)]
    pub status: Option<RunState>,
}
