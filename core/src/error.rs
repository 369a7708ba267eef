// core/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
  #[error("Step not found: {step_name}")]
  StepNotFound { step_name: String },

  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Run '{run_key}' is already in progress")]
  RunInProgress { run_key: String },

  #[error("Journal operation '{operation}' failed for run '{run_key}'. Source: {source}")]
  Journal {
    run_key: String,
    operation: &'static str,
    #[source]
    source: AnyhowError,
  },

  #[error("No pipeline registered for context type {type_name}")]
  PipelineNotRegistered { type_name: &'static str },

  #[error("Error in handler or external operation. Source: {source}")]
  HandlerError {
    #[source]
    source: AnyhowError,
  },

  #[error("Configuration error for step '{step_name}': {message}")]
  ConfigurationError { step_name: String, message: String },

  #[error("Internal stepflow error: {0}")]
  Internal(String),
}

impl From<AnyhowError> for FlowError {
  fn from(err: AnyhowError) -> Self {
    FlowError::HandlerError { source: err }
  }
}

impl FlowError {
  /// Wraps a storage error raised by a [`crate::StepJournal`] implementation.
  pub fn journal<E>(run_key: &str, operation: &'static str, err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    FlowError::Journal {
      run_key: run_key.to_string(),
      operation,
      source: AnyhowError::new(err),
    }
  }
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;
