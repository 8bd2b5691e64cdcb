use async_trait::async_trait;
use spur_types::{RunStatusResponse, StartRunRequest, StartRunResponse};

use crate::error::SdkError;

/// Remote service that executes workflows and reports on their runs
#[async_trait]
pub trait ExecutionService: Send + Sync {
    /// Start a run and return its handle
    async fn start_run(&self, request: StartRunRequest) -> Result<StartRunResponse, SdkError>;

    /// Fetch the current status of a run, including per-task outputs
    async fn get_run_status(&self, run_id: &str) -> Result<RunStatusResponse, SdkError>;

    /// Get service name (e.g., "spur")
    fn service_name(&self) -> &str;
}
