// tests/registry_tests.rs
mod common;

use common::*;
use stepflow::{ContextData, FlowError, Flows, MemoryJournal, Pipeline, PipelineControl, PipelineResult, StepDef};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct AlphaContext {
  val: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct BetaContext {
  num: i32,
}

fn registry() -> Flows<TestError> {
  let flows = Flows::<TestError>::new();

  let mut alpha = Pipeline::<AlphaContext, TestError>::new("alpha", vec![StepDef::required("alpha_task")]);
  alpha.on_step("alpha_task", |ctx: ContextData<AlphaContext>| {
    Box::pin(async move {
      ctx.write().val = "alpha_processed".to_string();
      Ok::<PipelineControl, FlowError>(PipelineControl::Continue)
    })
  });
  flows.register(alpha);

  let mut beta = Pipeline::<BetaContext, TestError>::new("beta", vec![StepDef::required("beta_task")]);
  beta.on_step("beta_task", |ctx: ContextData<BetaContext>| {
    Box::pin(async move {
      ctx.write().num += 100;
      Ok::<PipelineControl, FlowError>(PipelineControl::Continue)
    })
  });
  flows.register(beta);

  flows
}

#[tokio::test]
async fn test_registry_runs_pipeline_for_context_type() {
  setup_tracing();
  let flows = registry();
  assert!(flows.is_registered::<AlphaContext>());

  let alpha = ContextData::new(AlphaContext::default());
  assert_eq!(flows.run(alpha.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(alpha.read().val, "alpha_processed");

  let beta = ContextData::new(BetaContext::default());
  assert_eq!(flows.run(beta.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(beta.read().num, 100);
}

#[tokio::test]
async fn test_registry_pipeline_not_registered() {
  setup_tracing();
  let flows = Flows::<TestError>::new();

  let result = flows.run(ContextData::new(AlphaContext::default())).await;

  match result {
    Err(TestError::Flow(s)) => assert!(s.contains("PipelineNotRegistered")),
    other => panic!("Expected PipelineNotRegistered, got {:?}", other),
  }
}

#[tokio::test]
async fn test_registry_journaled_run_resumes() {
  setup_tracing();
  let flows = registry();
  let journal = MemoryJournal::new();

  let beta = ContextData::new(BetaContext::default());
  flows.run_journaled(beta.clone(), "beta-1", &journal).await.unwrap();
  flows.run_journaled(beta.clone(), "beta-1", &journal).await.unwrap();

  // Second run found beta_task already completed.
  assert_eq!(beta.read().num, 100);
}
