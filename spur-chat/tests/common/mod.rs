#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use spur_chat::{PollerConfig, RunPoller};
use spur_sdk::{ExecutionService, SdkError};
use spur_types::{RunStatusResponse, StartRunRequest, StartRunResponse};
use tokio::time::Instant;

pub enum StatusStep {
    Snapshot(RunStatusResponse),
    Error(String),
}

/// Backend double that replays scripted status snapshots.
///
/// Once the script runs out every query reports the run as RUNNING.
#[derive(Default)]
pub struct ScriptedService {
    start_error: Mutex<Option<String>>,
    start_delay: Mutex<Duration>,
    statuses: Mutex<VecDeque<StatusStep>>,
    status_delay: Mutex<Duration>,
    pub requests: Mutex<Vec<StartRunRequest>>,
    pub status_calls: Mutex<Vec<(String, Instant)>>,
    runs_started: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl ScriptedService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_status(&self, status: RunStatusResponse) {
        self.statuses
            .lock()
            .unwrap()
            .push_back(StatusStep::Snapshot(status));
    }

    pub fn push_status_error(&self, message: &str) {
        self.statuses
            .lock()
            .unwrap()
            .push_back(StatusStep::Error(message.to_string()));
    }

    pub fn fail_start(&self, message: &str) {
        *self.start_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn set_start_delay(&self, delay: Duration) {
        *self.start_delay.lock().unwrap() = delay;
    }

    pub fn set_status_delay(&self, delay: Duration) {
        *self.status_delay.lock().unwrap() = delay;
    }

    pub fn start_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn status_call_count(&self) -> usize {
        self.status_calls.lock().unwrap().len()
    }

    pub fn status_call_times(&self) -> Vec<Instant> {
        self.status_calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, at)| *at)
            .collect()
    }
}

#[async_trait]
impl ExecutionService for ScriptedService {
    async fn start_run(&self, request: StartRunRequest) -> Result<StartRunResponse, SdkError> {
        self.requests.lock().unwrap().push(request);

        let delay = *self.start_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = self.start_error.lock().unwrap().clone() {
            return Err(SdkError::api_error(500, message));
        }

        let run_number = self.runs_started.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(StartRunResponse {
            id: format!("R{}", run_number),
            workflow_id: None,
            status: None,
        })
    }

    async fn get_run_status(&self, run_id: &str) -> Result<RunStatusResponse, SdkError> {
        self.status_calls
            .lock()
            .unwrap()
            .push((run_id.to_string(), Instant::now()));

        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        let delay = *self.status_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let step = self.statuses.lock().unwrap().pop_front();
        match step {
            Some(StatusStep::Snapshot(status)) => Ok(status),
            Some(StatusStep::Error(message)) => Err(SdkError::internal(message)),
            None => Ok(running(run_id)),
        }
    }

    fn service_name(&self) -> &str {
        "scripted"
    }
}

pub fn snapshot(run_id: &str, status: &str, nodes: Value, tasks: Value) -> RunStatusResponse {
    serde_json::from_value(json!({
        "id": run_id,
        "status": status,
        "tasks": tasks,
        "workflow_version": {"definition": {"nodes": nodes, "links": []}}
    }))
    .unwrap()
}

pub fn chat_nodes() -> Value {
    json!([
        {"id": "input_node", "node_type": "InputNode"},
        {"id": "output_node", "node_type": "OutputNode"}
    ])
}

pub fn running(run_id: &str) -> RunStatusResponse {
    snapshot(run_id, "RUNNING", chat_nodes(), json!([]))
}

pub fn completed_with_outputs(run_id: &str, outputs: Value) -> RunStatusResponse {
    snapshot(
        run_id,
        "COMPLETED",
        chat_nodes(),
        json!([
            {"node_id": "input_node", "status": "COMPLETED", "outputs": {"user_message": "hi"}},
            {"node_id": "output_node", "status": "COMPLETED", "outputs": outputs}
        ]),
    )
}

pub fn completed_with_reply(run_id: &str, reply: &str) -> RunStatusResponse {
    completed_with_outputs(run_id, json!({"assistant_message": reply}))
}

pub fn poller_for(service: &Arc<ScriptedService>) -> RunPoller {
    poller_with_config(service, PollerConfig::default())
}

pub fn poller_with_config(service: &Arc<ScriptedService>, config: PollerConfig) -> RunPoller {
    RunPoller::new(service.clone(), config)
        .unwrap()
        .with_workflow_id("S1")
}

/// Let spawned tasks run without crossing a poll tick
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}
