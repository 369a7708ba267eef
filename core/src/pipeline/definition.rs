// core/src/pipeline/definition.rs

use crate::core::handler::Handler;
use crate::core::step::StepDef;
use crate::error::FlowError;
use std::collections::HashMap;

/// An ordered list of named steps over a context of type `TData`, whose
/// handlers fail with `Err`.
///
/// `Err` must be constructible from [`FlowError`] so that engine-level
/// failures (missing handlers, journal errors) surface as the caller's error.
pub struct Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) name: String,
  pub(crate) steps: Vec<StepDef<TData>>,
  pub(crate) before: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) on: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) after: HashMap<String, Vec<Handler<TData, Err>>>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Panics on duplicate step names; that is a wiring bug, not a runtime condition.
  pub fn new(name: impl Into<String>, steps: Vec<StepDef<TData>>) -> Self {
    let name = name.into();
    for (idx, step) in steps.iter().enumerate() {
      if steps[..idx].iter().any(|s| s.name == step.name) {
        panic!("stepflow setup error: step '{}' declared twice in pipeline '{}'.", step.name, name);
      }
    }
    Self {
      name,
      steps,
      before: HashMap::new(),
      on: HashMap::new(),
      after: HashMap::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  pub(crate) fn position_of(&self, step_name: &str) -> Option<usize> {
    self.steps.iter().position(|s| s.name == step_name)
  }

  pub(crate) fn ensure_step_exists(&self, step_name: &str) {
    if self.position_of(step_name).is_none() {
      panic!(
        "stepflow setup error: step '{}' not found in pipeline '{}'.",
        step_name, self.name
      );
    }
  }
}
