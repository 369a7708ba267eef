// core/src/pipeline/execution.rs

//! `Pipeline::run` and `Pipeline::run_journaled`.

use crate::core::context_data::ContextData;
use crate::core::control::{PipelineControl, PipelineResult};
use crate::core::handler::Handler;
use crate::core::step::StepDef;
use crate::error::FlowError;
use crate::journal::{idempotency_key, RunOutcome, StepJournal};
use crate::pipeline::definition::Pipeline;
use std::collections::HashMap;
use tracing::{event, info_span, instrument, Instrument, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepOutcome {
  Ran,
  Skipped,
  Stopped,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  async fn run_phase(
    &self,
    phase: &'static str,
    handlers: &HashMap<String, Vec<Handler<TData, Err>>>,
    step_name: &str,
    ctx_data: &ContextData<TData>,
  ) -> Result<PipelineControl, Err> {
    let Some(handlers) = handlers.get(step_name) else {
      return Ok(PipelineControl::Continue);
    };
    for (handler_idx, handler_fn) in handlers.iter().enumerate() {
      match handler_fn(ctx_data.clone()).await {
        Ok(PipelineControl::Continue) => {}
        Ok(PipelineControl::Stop) => {
          event!(Level::INFO, phase = phase, handler_index = handler_idx, "Pipeline stopped by handler.");
          return Ok(PipelineControl::Stop);
        }
        Err(e) => {
          event!(Level::ERROR, phase = phase, handler_index = handler_idx, error = %e, "Handler failed.");
          return Err(e);
        }
      }
    }
    Ok(PipelineControl::Continue)
  }

  async fn execute_step(&self, step_def: &StepDef<TData>, ctx_data: &ContextData<TData>) -> Result<StepOutcome, Err> {
    let step_name = step_def.name.as_str();

    if let Some(skip_cond) = &step_def.skip_if {
      if skip_cond(ctx_data.clone()) {
        event!(Level::INFO, "Step skipped by its skip condition.");
        return Ok(StepOutcome::Skipped);
      }
    }

    let has_handlers = [&self.before, &self.on, &self.after]
      .iter()
      .any(|phase| phase.get(step_name).map_or(false, |v| !v.is_empty()));
    if !has_handlers {
      if step_def.optional {
        event!(Level::DEBUG, "Optional step has no handlers, skipping.");
        return Ok(StepOutcome::Skipped);
      }
      event!(Level::ERROR, "Non-optional step has no handlers.");
      return Err(Err::from(FlowError::HandlerMissing {
        step_name: step_def.name.clone(),
      }));
    }

    for (phase, handlers) in [("before", &self.before), ("on", &self.on), ("after", &self.after)] {
      if self.run_phase(phase, handlers, step_name, ctx_data).await? == PipelineControl::Stop {
        return Ok(StepOutcome::Stopped);
      }
    }
    Ok(StepOutcome::Ran)
  }

  /// Runs every step in order against `ctx_data`.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(pipeline = %self.name, num_steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let span = info_span!("pipeline_step", step_name = %step_def.name, step_index = step_idx);
      if self.execute_step(step_def, &ctx_data).instrument(span).await? == StepOutcome::Stopped {
        return Ok(PipelineResult::Stopped);
      }
    }
    event!(Level::DEBUG, "Pipeline completed.");
    Ok(PipelineResult::Completed)
  }

  /// Runs the pipeline under a claim on `run_key`.
  ///
  /// Steps up to and including the journal's last completed step are not run
  /// again. Each step that runs to completion is recorded with its idempotency
  /// key before the next one starts. The claim is released with the run's
  /// outcome whether it completes, stops or fails.
  #[instrument(
    name = "Pipeline::run_journaled",
    skip_all,
    fields(pipeline = %self.name, run_key = %run_key),
    err(Display)
  )]
  pub async fn run_journaled(
    &self,
    ctx_data: ContextData<TData>,
    run_key: &str,
    journal: &dyn StepJournal,
  ) -> Result<PipelineResult, Err> {
    let progress = journal.claim(run_key).await.map_err(Err::from)?;

    let resume_from = match progress.last_completed_step.as_deref() {
      None => 0,
      Some(last) => match self.position_of(last) {
        Some(idx) => idx + 1,
        None => {
          let err = FlowError::ConfigurationError {
            step_name: last.to_string(),
            message: format!("journal references a step unknown to pipeline '{}'", self.name),
          };
          self.release_quietly(journal, run_key, RunOutcome::Failed).await;
          return Err(Err::from(err));
        }
      },
    };
    if resume_from > 0 {
      event!(Level::INFO, resume_from = resume_from, "Resuming journaled run after last completed step.");
    }

    for (step_idx, step_def) in self.steps.iter().enumerate().skip(resume_from) {
      let span = info_span!("pipeline_step", step_name = %step_def.name, step_index = step_idx);
      let outcome = match self.execute_step(step_def, &ctx_data).instrument(span).await {
        Ok(outcome) => outcome,
        Err(e) => {
          self.release_quietly(journal, run_key, RunOutcome::Failed).await;
          return Err(e);
        }
      };
      match outcome {
        StepOutcome::Stopped => {
          journal.release(run_key, RunOutcome::Stopped).await.map_err(Err::from)?;
          return Ok(PipelineResult::Stopped);
        }
        StepOutcome::Skipped => {}
        StepOutcome::Ran => {
          let key = idempotency_key(run_key, &step_def.name);
          if let Err(e) = journal.record_step(run_key, &step_def.name, &key).await {
            self.release_quietly(journal, run_key, RunOutcome::Failed).await;
            return Err(Err::from(e));
          }
        }
      }
    }

    journal.release(run_key, RunOutcome::Completed).await.map_err(Err::from)?;
    Ok(PipelineResult::Completed)
  }

  // The run's own error wins over a failure to release.
  async fn release_quietly(&self, journal: &dyn StepJournal, run_key: &str, outcome: RunOutcome) {
    if let Err(release_err) = journal.release(run_key, outcome).await {
      event!(Level::ERROR, error = %release_err, "Failed to release journal claim.");
    }
  }
}
