// core/src/registry.rs

//! `Flows<E>`: a registry of pipelines keyed by their context type.
//!
//! Callers hand the registry a `ContextData<TData>` and it dispatches to the
//! pipeline registered for `TData`, returning the application error type `E`.

use crate::core::context_data::ContextData;
use crate::core::control::PipelineResult;
use crate::error::FlowError;
use crate::journal::StepJournal;
use crate::pipeline::definition::Pipeline;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{event, Level};

#[async_trait]
trait ErasedRunner<AppErr>: Send + Sync {
  async fn run_erased(
    &self,
    ctx_obj: Box<dyn Any + Send>,
    journal: Option<(&str, &dyn StepJournal)>,
  ) -> Result<PipelineResult, AppErr>;
}

struct Registered<TData, PipeErr, AppErr>
where
  TData: 'static + Send + Sync,
  PipeErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pipeline: Arc<Pipeline<TData, PipeErr>>,
  _app_err: PhantomData<fn() -> AppErr>,
}

#[async_trait]
impl<TData, PipeErr, AppErr> ErasedRunner<AppErr> for Registered<TData, PipeErr, AppErr>
where
  TData: 'static + Send + Sync,
  PipeErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
  AppErr: std::error::Error + From<PipeErr> + From<FlowError> + Send + Sync + 'static,
{
  async fn run_erased(
    &self,
    ctx_obj: Box<dyn Any + Send>,
    journal: Option<(&str, &dyn StepJournal)>,
  ) -> Result<PipelineResult, AppErr> {
    let ctx_data = match ctx_obj.downcast::<ContextData<TData>>() {
      Ok(boxed) => *boxed,
      Err(_) => {
        return Err(AppErr::from(FlowError::Internal(format!(
          "registry dispatched a context that is not ContextData<{}>",
          std::any::type_name::<TData>()
        ))))
      }
    };
    let result = match journal {
      Some((run_key, journal)) => self.pipeline.run_journaled(ctx_data, run_key, journal).await,
      None => self.pipeline.run(ctx_data).await,
    };
    result.map_err(AppErr::from)
  }
}

/// Pipeline registry returning `AppErr` from every run.
pub struct Flows<AppErr = FlowError>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pipelines: RwLock<HashMap<TypeId, Arc<dyn ErasedRunner<AppErr>>>>,
}

impl<AppErr> Default for Flows<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<AppErr> Flows<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      pipelines: RwLock::new(HashMap::new()),
    }
  }

  /// Registers `pipeline` for its context type, replacing any earlier one.
  pub fn register<TData, PipeErr>(&self, pipeline: Pipeline<TData, PipeErr>)
  where
    TData: 'static + Send + Sync,
    PipeErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
    AppErr: From<PipeErr>,
  {
    event!(Level::DEBUG, pipeline = %pipeline.name(), tdata_type = %std::any::type_name::<TData>(), "Registering pipeline.");
    let runner = Registered::<TData, PipeErr, AppErr> {
      pipeline: Arc::new(pipeline),
      _app_err: PhantomData,
    };
    self.pipelines.write().insert(TypeId::of::<TData>(), Arc::new(runner));
  }

  pub fn is_registered<TData: 'static>(&self) -> bool {
    self.pipelines.read().contains_key(&TypeId::of::<TData>())
  }

  fn runner_for<TData: 'static>(&self) -> Result<Arc<dyn ErasedRunner<AppErr>>, AppErr> {
    self.pipelines.read().get(&TypeId::of::<TData>()).cloned().ok_or_else(|| {
      let type_name = std::any::type_name::<TData>();
      event!(Level::ERROR, "No pipeline registered for {}.", type_name);
      AppErr::from(FlowError::PipelineNotRegistered { type_name })
    })
  }

  /// Runs the pipeline registered for `TData`.
  pub async fn run<TData>(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, AppErr>
  where
    TData: 'static + Send + Sync,
  {
    let runner = self.runner_for::<TData>()?;
    runner.run_erased(Box::new(ctx_data), None).await
  }

  /// Runs the pipeline registered for `TData` under a journal claim on `run_key`.
  pub async fn run_journaled<TData>(
    &self,
    ctx_data: ContextData<TData>,
    run_key: &str,
    journal: &dyn StepJournal,
  ) -> Result<PipelineResult, AppErr>
  where
    TData: 'static + Send + Sync,
  {
    let runner = self.runner_for::<TData>()?;
    runner.run_erased(Box::new(ctx_data), Some((run_key, journal))).await
  }
}
