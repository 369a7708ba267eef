// tests/pipeline_execution_tests.rs
mod common;

use common::*;
use serial_test::serial;
use stepflow::{ContextData, FlowError, Pipeline, PipelineControl, PipelineResult, StepDef};

fn three_step_pipeline() -> Pipeline<TestContext, TestError> {
  let mut pipeline = Pipeline::<TestContext, TestError>::new(
    "three_steps",
    vec![StepDef::required("step1"), StepDef::required("step2"), StepDef::required("step3")],
  );
  pipeline.on_step_boxed("step1", create_simple_handler("step1", " S1"));
  pipeline.on_step_boxed("step2", create_simple_handler("step2", " S2"));
  pipeline.on_step_boxed("step3", create_simple_handler("step3", " S3"));
  pipeline
}

#[tokio::test]
#[serial]
async fn test_pipeline_runs_steps_in_order() {
  setup_tracing();
  let pipeline = three_step_pipeline();
  assert_eq!(pipeline.step_names(), vec!["step1", "step2", "step3"]);

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Completed);
  let guard = ctx.read();
  assert_eq!(guard.counter, 3);
  assert_eq!(guard.message, " S1 S2 S3");
  assert_eq!(guard.steps_executed, vec!["step1", "step2", "step3"]);
}

#[tokio::test]
#[serial]
async fn test_pipeline_stops_on_pipeline_control_stop() {
  setup_tracing();
  let pipeline = three_step_pipeline();
  let ctx = ContextData::new(TestContext {
    should_stop_at: Some("step2".to_string()),
    ..Default::default()
  });

  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Stopped);
  assert_eq!(ctx.read().steps_executed, vec!["step1", "step2"]);
}

#[tokio::test]
#[serial]
async fn test_pipeline_propagates_handler_error() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(
    "failing",
    vec![
      StepDef::required("good_step"),
      StepDef::required("bad_step"),
      StepDef::required("another_step"),
    ],
  );
  pipeline.on_step_boxed("good_step", create_simple_handler("good_step", "Good"));
  pipeline.on_step_boxed("bad_step", create_failing_handler("bad_step", "I am a bad step!"));
  pipeline.on_step_boxed("another_step", create_simple_handler("another_step", "NeverRun"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap_err(), TestError::Handler("I am a bad step!".to_string()));
  let guard = ctx.read();
  assert_eq!(guard.message, "Good");
  assert_eq!(guard.steps_executed, vec!["good_step", "bad_step"]);
}

#[tokio::test]
#[serial]
async fn test_pipeline_skips_step_if_condition_met() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(
    "skipping",
    vec![
      StepDef::required("step1"),
      StepDef::required("step_to_skip").skip_if(|ctx: ContextData<TestContext>| ctx.read().counter > 0),
      StepDef::required("step3"),
    ],
  );
  pipeline.on_step_boxed("step1", create_simple_handler("step1", " S1"));
  pipeline.on_step_boxed("step_to_skip", create_simple_handler("step_to_skip", " SKIPPED"));
  pipeline.on_step_boxed("step3", create_simple_handler("step3", " S3"));

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);

  let guard = ctx.read();
  assert_eq!(guard.message, " S1 S3");
  assert_eq!(guard.steps_executed, vec!["step1", "step3"]);
}

#[tokio::test]
#[serial]
async fn test_non_optional_step_missing_handler_fails() {
  setup_tracing();
  let pipeline = Pipeline::<TestContext, TestError>::new("no_handlers", vec![StepDef::required("step_with_no_handler")]);

  let result = pipeline.run(ContextData::new(TestContext::default())).await;

  match result {
    Err(TestError::Flow(s)) => {
      assert!(s.contains("HandlerMissing"));
      assert!(s.contains("step_with_no_handler"));
    }
    other => panic!("Expected HandlerMissing, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn test_optional_step_missing_handler_succeeds() {
  setup_tracing();
  let pipeline = Pipeline::<TestContext, TestError>::new("optional", vec![StepDef::optional("notify")]);

  let result = pipeline.run(ContextData::new(TestContext::default())).await;

  assert_eq!(result.unwrap(), PipelineResult::Completed);
}

#[tokio::test]
#[serial]
async fn test_before_on_after_execution_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new("phases", vec![StepDef::required("main_step")]);
  pipeline.before_step("main_step", create_simple_handler("before_main", "Before;"));
  pipeline.on_step("main_step", create_simple_handler("on_main", "On;"));
  pipeline.after_step("main_step", create_simple_handler("after_main", "After;"));

  let ctx = ContextData::new(TestContext::default());
  pipeline.run(ctx.clone()).await.unwrap();

  let guard = ctx.read();
  assert_eq!(guard.message, "Before;On;After;");
  assert_eq!(guard.steps_executed, vec!["before_main", "on_main", "after_main"]);
}

#[tokio::test]
#[serial]
async fn test_handlers_may_return_flow_error() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new("flow_err", vec![StepDef::required("task")]);
  pipeline.on_step("task", |_ctx: ContextData<TestContext>| {
    Box::pin(async move { Err::<PipelineControl, FlowError>(FlowError::Internal("boom".to_string())) })
  });

  let result = pipeline.run(ContextData::new(TestContext::default())).await;

  match result {
    Err(TestError::Flow(s)) => assert!(s.contains("boom")),
    other => panic!("Expected converted FlowError, got {:?}", other),
  }
}

#[test]
#[should_panic(expected = "declared twice")]
fn test_duplicate_step_names_panic() {
  let _ = Pipeline::<TestContext, TestError>::new("dupes", vec![StepDef::required("a"), StepDef::required("a")]);
}

#[test]
#[should_panic(expected = "not found")]
fn test_registering_handler_for_unknown_step_panics() {
  let mut pipeline = Pipeline::<TestContext, TestError>::new("unknown", vec![StepDef::required("a")]);
  pipeline.on_step_boxed("b", create_simple_handler("b", "B"));
}
