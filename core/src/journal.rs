// core/src/journal.rs

//! Step journal used by [`crate::Pipeline::run_journaled`].
//!
//! A journaled run is identified by a run key (for shipments: the order id).
//! The journal hands out one claim per key at a time, remembers the last step
//! that completed, and is told how the run ended so the claim is released.

use crate::error::FlowError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

/// What the journal knows about a run when it is claimed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunProgress {
  pub last_completed_step: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
  Completed,
  Stopped,
  Failed,
}

impl RunOutcome {
  pub fn as_str(&self) -> &'static str {
    match self {
      RunOutcome::Completed => "completed",
      RunOutcome::Stopped => "stopped",
      RunOutcome::Failed => "failed",
    }
  }
}

#[async_trait]
pub trait StepJournal: Send + Sync {
  /// Claims `run_key`. Returns [`FlowError::RunInProgress`] while another
  /// execution holds the claim.
  async fn claim(&self, run_key: &str) -> Result<RunProgress, FlowError>;

  /// Marks `step_name` as completed for `run_key`.
  async fn record_step(&self, run_key: &str, step_name: &str, idempotency_key: &str) -> Result<(), FlowError>;

  /// Releases the claim taken by [`StepJournal::claim`].
  async fn release(&self, run_key: &str, outcome: RunOutcome) -> Result<(), FlowError>;
}

/// Idempotency key of one step within one run.
pub fn idempotency_key(run_key: &str, step_name: &str) -> String {
  format!("{}:{}", run_key, step_name)
}

#[derive(Debug, Default, Clone)]
struct MemoryRun {
  in_progress: bool,
  completed: Vec<(String, String)>,
  last_outcome: Option<RunOutcome>,
}

/// Process-local journal. Used by tests and by the storefront's in-memory store.
#[derive(Debug, Default)]
pub struct MemoryJournal {
  runs: Mutex<HashMap<String, MemoryRun>>,
}

impl MemoryJournal {
  pub fn new() -> Self {
    Self::default()
  }

  /// Steps recorded for `run_key`, in completion order, with their idempotency keys.
  pub fn completed_steps(&self, run_key: &str) -> Vec<(String, String)> {
    self
      .runs
      .lock()
      .get(run_key)
      .map(|run| run.completed.clone())
      .unwrap_or_default()
  }

  pub fn last_outcome(&self, run_key: &str) -> Option<RunOutcome> {
    self.runs.lock().get(run_key).and_then(|run| run.last_outcome)
  }

  pub fn is_claimed(&self, run_key: &str) -> bool {
    self.runs.lock().get(run_key).map_or(false, |run| run.in_progress)
  }
}

#[async_trait]
impl StepJournal for MemoryJournal {
  async fn claim(&self, run_key: &str) -> Result<RunProgress, FlowError> {
    let mut runs = self.runs.lock();
    let run = runs.entry(run_key.to_string()).or_default();
    if run.in_progress {
      return Err(FlowError::RunInProgress {
        run_key: run_key.to_string(),
      });
    }
    run.in_progress = true;
    Ok(RunProgress {
      last_completed_step: run.completed.last().map(|(step, _)| step.clone()),
    })
  }

  async fn record_step(&self, run_key: &str, step_name: &str, idempotency_key: &str) -> Result<(), FlowError> {
    let mut runs = self.runs.lock();
    let run = runs.get_mut(run_key).ok_or_else(|| {
      FlowError::Internal(format!("record_step for unclaimed run '{}'", run_key))
    })?;
    run.completed.push((step_name.to_string(), idempotency_key.to_string()));
    Ok(())
  }

  async fn release(&self, run_key: &str, outcome: RunOutcome) -> Result<(), FlowError> {
    if let Some(run) = self.runs.lock().get_mut(run_key) {
      run.in_progress = false;
      run.last_outcome = Some(outcome);
    }
    Ok(())
  }
}
