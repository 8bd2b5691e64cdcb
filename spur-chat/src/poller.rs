//! Run poller: starts a workflow run for a chat message and polls it to a reply.
//!
//! Phases move `Idle -> Starting -> Polling -> Resolved | Failed`. Each run is
//! polled by one spawned task whose abort handle lives in the poller's
//! [`TimerSet`]. A later `execute`, `cleanup` or drop aborts it, and a task
//! only applies its result while it is still tracked and its turn is current.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use spur_sdk::ExecutionService;
use spur_types::{ChatInputs, ChatMessage, StartRunRequest};
use tokio::sync::oneshot;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

use crate::config::PollerConfig;
use crate::error::ChatError;
use crate::outcome::ChatOutcome;
use crate::resolution::{
    error_reply, resolve_terminal_status, APOLOGY_REPLY, NO_WORKFLOW_CONNECTED, POLL_TIMED_OUT,
    START_FAILED_FALLBACK, STATUS_QUERY_FAILED,
};
use crate::session::{Conversation, SessionManager};
use crate::timers::{TimerId, TimerSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum PollerPhase {
    Idle,
    Starting,
    Polling { run_id: String },
    Resolved,
    Failed,
}

impl PollerPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PollerPhase::Resolved | PollerPhase::Failed)
    }
}

/// Everything the presentation layer observes, read under one lock
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollerSnapshot {
    pub is_loading: bool,
    pub error: Option<String>,
    pub session_id: String,
    pub phase: PollerPhase,
}

struct PollerState {
    phase: PollerPhase,
    is_loading: bool,
    error: Option<String>,
    workflow_id: Option<String>,
    session: SessionManager,
    conversation: Conversation,
    /// Bumped by every `execute` and `cleanup`; older turns may no longer touch state
    turn: u64,
}

impl PollerState {
    fn finish(&mut self, user_message: &str, outcome: &ChatOutcome) {
        self.is_loading = false;
        match outcome {
            ChatOutcome::Reply(reply) => {
                self.phase = PollerPhase::Resolved;
                self.error = None;
                self.conversation.record_turn(user_message, reply);
            }
            ChatOutcome::Failed { error, .. } => {
                self.phase = PollerPhase::Failed;
                self.error = Some(error.clone());
            }
            ChatOutcome::Cancelled => {}
        }
    }
}

/// State shared between the poller handle and its poll tasks.
///
/// Lock order is always `state` then `timers`.
struct Shared {
    state: Mutex<PollerState>,
    timers: Mutex<TimerSet>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, PollerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn timers(&self) -> MutexGuard<'_, TimerSet> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply the result of `turn` if nothing superseded it
    fn finish_turn(&self, turn: u64, user_message: &str, outcome: &ChatOutcome) -> bool {
        let mut state = self.state();
        if state.turn != turn {
            return false;
        }
        state.finish(user_message, outcome);
        true
    }

    /// Apply the result of a poll timer if it is still tracked
    fn finish_timer(
        &self,
        turn: u64,
        timer_id: TimerId,
        user_message: &str,
        outcome: &ChatOutcome,
    ) -> bool {
        let mut state = self.state();
        if state.turn != turn || !self.timers().release(timer_id) {
            return false;
        }
        state.finish(user_message, outcome);
        true
    }
}

/// Drives chat turns against a workflow execution backend
pub struct RunPoller {
    service: Arc<dyn ExecutionService>,
    config: PollerConfig,
    shared: Arc<Shared>,
}

impl RunPoller {
    pub fn new(service: Arc<dyn ExecutionService>, config: PollerConfig) -> Result<Self, ChatError> {
        config.validate()?;

        let state = PollerState {
            phase: PollerPhase::Idle,
            is_loading: false,
            error: None,
            workflow_id: None,
            session: SessionManager::new(None),
            conversation: Conversation::new(config.history_limit),
            turn: 0,
        };

        Ok(Self {
            service,
            config,
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                timers: Mutex::new(TimerSet::new()),
            }),
        })
    }

    pub fn with_workflow_id(self, workflow_id: impl Into<String>) -> Self {
        self.set_workflow_id(Some(workflow_id.into()));
        self
    }

    pub fn with_session_id(self, session_id: Option<&str>) -> Self {
        if let Some(session_id) = session_id {
            self.set_session_id(session_id);
        }
        self
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Connect (or with `None`, disconnect) the workflow that answers chat turns
    pub fn set_workflow_id(&self, workflow_id: Option<String>) {
        self.shared.state().workflow_id = workflow_id.filter(|id| !id.is_empty());
    }

    pub fn workflow_id(&self) -> Option<String> {
        self.shared.state().workflow_id.clone()
    }

    /// Adopt a caller-held session id. Empty ids are ignored.
    ///
    /// History belongs to the old session and is dropped when the id changes.
    pub fn set_session_id(&self, session_id: &str) -> bool {
        let mut state = self.shared.state();
        let changed = state.session.adopt(session_id);
        if changed {
            info!("Adopted session id {}", session_id);
            state.conversation.clear();
        }
        changed
    }

    /// Start a new conversation with a fresh session id
    pub fn reset_session(&self) -> String {
        let mut state = self.shared.state();
        state.conversation.clear();
        let session_id = state.session.renew().to_string();
        info!("Started new session {}", session_id);
        session_id
    }

    pub fn session_id(&self) -> String {
        self.shared.state().session.session_id().to_string()
    }

    pub fn is_loading(&self) -> bool {
        self.shared.state().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.shared.state().error.clone()
    }

    pub fn phase(&self) -> PollerPhase {
        self.shared.state().phase.clone()
    }

    pub fn snapshot(&self) -> PollerSnapshot {
        let state = self.shared.state();
        PollerSnapshot {
            is_loading: state.is_loading,
            error: state.error.clone(),
            session_id: state.session.session_id().to_string(),
            phase: state.phase.clone(),
        }
    }

    /// Completed turns of the current session
    pub fn history(&self) -> Vec<ChatMessage> {
        self.shared.state().conversation.entries().to_vec()
    }

    /// Number of poll timers currently armed
    pub fn active_timers(&self) -> usize {
        self.shared.timers().len()
    }

    /// Return to `Idle` once the caller has consumed a terminal result
    pub fn acknowledge(&self) {
        let mut state = self.shared.state();
        if state.phase.is_terminal() {
            state.phase = PollerPhase::Idle;
        }
    }

    /// Run the connected workflow for one chat message and wait for its reply.
    ///
    /// Never fails: every error is folded into [`ChatOutcome::Failed`] with a
    /// displayable reply and mirrored in [`error`](Self::error). A turn that is
    /// superseded by another `execute` or by [`cleanup`](Self::cleanup)
    /// resolves to [`ChatOutcome::Cancelled`].
    ///
    /// Dropping the future while the run is still starting returns the poller
    /// to `Idle`. Once the run is being polled, the poll keeps going and its
    /// result still lands in the poller state; call `cleanup` to stop it.
    pub async fn execute(&self, message: &str) -> ChatOutcome {
        let (turn, workflow_id, inputs) = {
            let mut state = self.shared.state();

            let cancelled = self.shared.timers().cancel_all();
            if cancelled > 0 {
                debug!("Cancelled {} poll timer(s) of the previous turn", cancelled);
            }
            state.turn += 1;

            let Some(workflow_id) = state.workflow_id.clone() else {
                warn!("Chat message dropped: {}", NO_WORKFLOW_CONNECTED);
                state.phase = PollerPhase::Failed;
                state.is_loading = false;
                state.error = Some(NO_WORKFLOW_CONNECTED.to_string());
                return ChatOutcome::failed(NO_WORKFLOW_CONNECTED, error_reply(NO_WORKFLOW_CONNECTED));
            };

            state.phase = PollerPhase::Starting;
            state.is_loading = true;
            state.error = None;

            let history = if self.config.send_history {
                state.conversation.entries().to_vec()
            } else {
                Vec::new()
            };
            let inputs = ChatInputs::new(message, state.session.session_id()).with_history(history);

            (state.turn, workflow_id, inputs)
        };
        let _abandoned = StartGuard {
            shared: &self.shared,
            turn,
        };

        info!("Starting run of workflow {}", workflow_id);
        let request = StartRunRequest::new(workflow_id, inputs.into_run_inputs())
            .with_run_mode(self.config.run_mode);

        let run = match self.service.start_run(request).await {
            Ok(run) => run,
            Err(err) => {
                error!("Error executing chat workflow: {}", err);
                let mut error = err.to_string();
                if error.is_empty() {
                    error = START_FAILED_FALLBACK.to_string();
                }
                let outcome = ChatOutcome::failed(error, APOLOGY_REPLY);
                return if self.shared.finish_turn(turn, message, &outcome) {
                    outcome
                } else {
                    ChatOutcome::Cancelled
                };
            }
        };

        let (tx, rx) = oneshot::channel();
        {
            let mut state = self.shared.state();
            if state.turn != turn {
                debug!("Run {} started for a superseded turn; not polling it", run.id);
                return ChatOutcome::Cancelled;
            }
            state.phase = PollerPhase::Polling {
                run_id: run.id.clone(),
            };

            let mut timers = self.shared.timers();
            let timer_id = timers.next_id();
            let task = PollTask {
                shared: Arc::clone(&self.shared),
                service: Arc::clone(&self.service),
                config: self.config.clone(),
                run_id: run.id.clone(),
                user_message: message.to_string(),
                turn,
                timer_id,
            };
            let handle = tokio::spawn(task.run(tx));
            timers.track(timer_id, handle.abort_handle());
            debug!("Polling run {} with timer {}", run.id, timer_id);
        }

        rx.await.unwrap_or_else(|_| {
            debug!("Turn {} was cancelled before its run resolved", turn);
            ChatOutcome::Cancelled
        })
    }

    /// Cancel every poll timer and invalidate turns still starting.
    ///
    /// Idempotent; also runs when the poller is dropped.
    pub fn cleanup(&self) {
        let mut state = self.shared.state();
        state.turn += 1;
        state.is_loading = false;
        if !state.phase.is_terminal() {
            state.phase = PollerPhase::Idle;
        }

        let cancelled = self.shared.timers().cancel_all();
        if cancelled > 0 {
            debug!("Cleanup cancelled {} poll timer(s)", cancelled);
        }
    }
}

impl Drop for RunPoller {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Resets a turn whose `execute` future was dropped before its run was polled
struct StartGuard<'a> {
    shared: &'a Shared,
    turn: u64,
}

impl Drop for StartGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.shared.state();
        if state.turn == self.turn && state.phase == PollerPhase::Starting {
            debug!("Turn {} abandoned while starting", self.turn);
            state.phase = PollerPhase::Idle;
            state.is_loading = false;
        }
    }
}

struct PollTask {
    shared: Arc<Shared>,
    service: Arc<dyn ExecutionService>,
    config: PollerConfig,
    run_id: String,
    user_message: String,
    turn: u64,
    timer_id: TimerId,
}

impl PollTask {
    async fn run(self, tx: oneshot::Sender<ChatOutcome>) {
        let outcome = self.poll_until_terminal().await;

        if self
            .shared
            .finish_timer(self.turn, self.timer_id, &self.user_message, &outcome)
        {
            // The caller may have stopped waiting; nothing to do then.
            let _ = tx.send(outcome);
        } else {
            debug!("Dropping result of run {}: timer no longer tracked", self.run_id);
        }
    }

    /// Query once per tick. Each query is awaited before the next tick, and
    /// ticks missed while a query was outstanding are skipped.
    async fn poll_until_terminal(&self) -> ChatOutcome {
        let period = self.config.poll_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut attempts: u32 = 0;
        loop {
            ticker.tick().await;
            attempts += 1;

            match self.service.get_run_status(&self.run_id).await {
                Ok(status) if status.status.is_terminal() => {
                    info!(
                        "Run {} finished with status {} after {} poll(s)",
                        self.run_id, status.status, attempts
                    );
                    return resolve_terminal_status(&status);
                }
                Ok(status) => {
                    trace!("Run {} is {} (poll {})", self.run_id, status.status, attempts);
                    if matches!(self.config.max_attempts, Some(max) if attempts >= max) {
                        warn!(
                            "Run {} still {} after {} polls; giving up",
                            self.run_id, status.status, attempts
                        );
                        return ChatOutcome::failed(POLL_TIMED_OUT, APOLOGY_REPLY);
                    }
                }
                Err(err) => {
                    error!("Error checking workflow status for run {}: {}", self.run_id, err);
                    return ChatOutcome::failed(STATUS_QUERY_FAILED, APOLOGY_REPLY);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use spur_sdk::SdkError;
    use spur_types::{RunStatusResponse, StartRunResponse};

    struct Unreachable;

    #[async_trait]
    impl ExecutionService for Unreachable {
        async fn start_run(&self, _request: StartRunRequest) -> Result<StartRunResponse, SdkError> {
            panic!("start_run must not be called");
        }

        async fn get_run_status(&self, _run_id: &str) -> Result<RunStatusResponse, SdkError> {
            panic!("get_run_status must not be called");
        }

        fn service_name(&self) -> &str {
            "unreachable"
        }
    }

    fn poller() -> RunPoller {
        RunPoller::new(Arc::new(Unreachable), PollerConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_no_workflow_connected() {
        let poller = poller();
        let outcome = poller.execute("hello").await;

        assert_eq!(outcome.error(), Some(NO_WORKFLOW_CONNECTED));
        assert_eq!(outcome.message().unwrap().message, "Error: No workflow connected");
        assert_eq!(poller.error().as_deref(), Some(NO_WORKFLOW_CONNECTED));
        assert_eq!(poller.phase(), PollerPhase::Failed);
        assert!(!poller.is_loading());
        assert_eq!(poller.active_timers(), 0);
    }

    #[test]
    fn test_empty_workflow_id_counts_as_disconnected() {
        let poller = poller().with_workflow_id("");
        assert_eq!(poller.workflow_id(), None);
    }

    #[test]
    fn test_acknowledge_returns_to_idle_only_from_terminal() {
        let poller = poller();
        poller.acknowledge();
        assert_eq!(poller.phase(), PollerPhase::Idle);

        poller.shared.state().phase = PollerPhase::Failed;
        poller.acknowledge();
        assert_eq!(poller.phase(), PollerPhase::Idle);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PollerConfig::default().with_max_attempts(Some(0));
        assert!(RunPoller::new(Arc::new(Unreachable), config).is_err());
    }

    #[test]
    fn test_session_change_clears_history() {
        let poller = poller().with_session_id(Some("first"));
        poller
            .shared
            .state()
            .conversation
            .record_turn("hi", &ChatMessage::assistant("hello"));
        assert_eq!(poller.history().len(), 2);

        assert!(!poller.set_session_id("first"));
        assert_eq!(poller.history().len(), 2);

        assert!(poller.set_session_id("second"));
        assert!(poller.history().is_empty());
        assert_eq!(poller.session_id(), "second");
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let poller = poller();
        poller.cleanup();
        poller.cleanup();
        assert_eq!(poller.active_timers(), 0);
    }
}
