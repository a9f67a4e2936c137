//! Single-flight guard around remote runs.
//!
//! At most one run is in flight. `start` hands back the future for the run only when
//! the controller was idle; a second attempt while running gets `None` and issues
//! nothing. Runs are not cancellable, so the future always resolves to an outcome.

use std::future::Future;

use super::{ExecutionResult, Executor};
use crate::error::RunError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Running,
}

/// Identifies one started run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTicket(u64);

#[derive(Debug)]
pub struct RunOutcome {
    pub ticket: RunTicket,
    pub result: Result<ExecutionResult, RunError>,
}

#[derive(Debug)]
pub struct InvocationController {
    phase: RunPhase,
    in_flight: Option<RunTicket>,
    next_id: u64,
}

impl Default for InvocationController {
    fn default() -> Self {
        Self::new()
    }
}

impl InvocationController {
    pub fn new() -> Self {
        Self { phase: RunPhase::Idle, in_flight: None, next_id: 1 }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == RunPhase::Running
    }

    /// Move to `Running` and hand out a ticket, or `None` if a run is already in flight.
    pub fn begin(&mut self) -> Option<RunTicket> {
        if self.is_running() {
            tracing::debug!("run requested while another is in flight; ignoring");
            return None;
        }
        let ticket = RunTicket(self.next_id);
        self.next_id += 1;
        self.phase = RunPhase::Running;
        self.in_flight = Some(ticket);
        Some(ticket)
    }

    /// Return to `Idle` once the run identified by `ticket` has completed.
    /// Returns false for a ticket that is not the one in flight.
    pub fn finish(&mut self, ticket: RunTicket) -> bool {
        if self.in_flight != Some(ticket) {
            return false;
        }
        self.in_flight = None;
        self.phase = RunPhase::Idle;
        true
    }

    /// Begin a run and return the future that performs it, or `None` when already running.
    pub fn start<E>(
        &mut self,
        executor: E,
        code: String,
        session_id: Option<String>,
    ) -> Option<impl Future<Output = RunOutcome> + Send + 'static>
    where
        E: Executor + Send + Sync + 'static,
    {
        let ticket = self.begin()?;
        Some(async move {
            let result = invoke(&executor, &code, session_id.as_deref()).await;
            RunOutcome { ticket, result }
        })
    }
}

/// Check the session precondition, then call the executor.
/// Without a session identifier no request is issued.
pub async fn invoke<E: Executor>(
    executor: &E,
    code: &str,
    session_id: Option<&str>,
) -> Result<ExecutionResult, RunError> {
    let session_id = session_id
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(RunError::MissingContext)?;
    let result = executor.execute(code, session_id).await;
    match &result {
        Ok(r) => tracing::info!(session_id, variables = r.variables.len(), "run finished"),
        Err(e) => tracing::warn!(session_id, error = %e, "run failed"),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    #[derive(Clone, Default)]
    struct CountingExecutor {
        calls: Arc<AtomicUsize>,
    }

    impl Executor for CountingExecutor {
        async fn execute(&self, code: &str, _session_id: &str) -> Result<ExecutionResult, RunError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok(ExecutionResult { output: code.trim().to_string(), ..Default::default() })
        }
    }

    #[tokio::test]
    async fn test_second_start_while_running_is_a_no_op() {
        let exec = CountingExecutor::default();
        let mut ctrl = InvocationController::new();

        let first = ctrl.start(exec.clone(), "print(1)".into(), Some("200".into()));
        let second = ctrl.start(exec.clone(), "print(2)".into(), Some("200".into()));
        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(ctrl.phase(), RunPhase::Running);

        let outcome = first.unwrap().await;
        assert_eq!(exec.calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.result.unwrap().output, "print(1)");

        assert!(ctrl.finish(outcome.ticket));
        assert_eq!(ctrl.phase(), RunPhase::Idle);
        assert!(ctrl.start(exec.clone(), "x".into(), Some("200".into())).is_some());
    }

    #[tokio::test]
    async fn test_missing_context_issues_no_call() {
        let exec = CountingExecutor::default();
        let err = invoke(&exec, "x = 1", None).await.unwrap_err();
        assert!(matches!(err, RunError::MissingContext));
        let err = invoke(&exec, "x = 1", Some("  ")).await.unwrap_err();
        assert!(matches!(err, RunError::MissingContext));
        assert_eq!(exec.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_run_still_returns_to_idle() {
        let exec = CountingExecutor::default();
        let mut ctrl = InvocationController::new();
        let outcome = ctrl.start(exec, "x".into(), None).unwrap().await;
        assert!(outcome.result.is_err());
        assert!(ctrl.finish(outcome.ticket));
        assert!(!ctrl.is_running());
    }

    #[test]
    fn test_stale_ticket_is_ignored() {
        let mut ctrl = InvocationController::new();
        let t1 = ctrl.begin().unwrap();
        assert!(ctrl.finish(t1));
        let t2 = ctrl.begin().unwrap();
        assert!(!ctrl.finish(t1));
        assert!(ctrl.is_running());
        assert!(ctrl.finish(t2));
    }
}
