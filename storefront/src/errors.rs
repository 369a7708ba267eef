// storefront/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use stepflow::FlowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Unauthorized: {0}")]
  Unauthorized(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Not Serviceable: {0}")]
  NotServiceable(String),

  /// Payment gateway or carrier failure. The detail is logged, never returned.
  #[error("Integration Error ({service}): {detail}")]
  Integration { service: &'static str, detail: String },

  #[error("Database Error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Workflow Error: {source}")]
  Flow {
    #[source]
    source: FlowError,
  },

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  pub fn integration(service: &'static str, detail: impl std::fmt::Display) -> Self {
    AppError::Integration {
      service,
      detail: detail.to_string(),
    }
  }
}

impl From<FlowError> for AppError {
  fn from(err: FlowError) -> Self {
    match err {
      FlowError::RunInProgress { run_key } => {
        AppError::Conflict(format!("A shipment run for order {} is already in progress", run_key))
      }
      other => AppError::Flow { source: other },
    }
  }
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(db_err) => AppError::Database(db_err),
      Err(err) => AppError::Internal(err.to_string()),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::NotServiceable(_) => StatusCode::UNPROCESSABLE_ENTITY,
      AppError::Integration { .. }
      | AppError::Database(_)
      | AppError::Flow { .. }
      | AppError::Config(_)
      | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with server error");
    } else {
      tracing::warn!(application_error = %self, status = status.as_u16(), "Responding with client error");
    }

    let message = match self {
      AppError::Validation(m)
      | AppError::Unauthorized(m)
      | AppError::Forbidden(m)
      | AppError::NotFound(m)
      | AppError::Conflict(m)
      | AppError::NotServiceable(m) => m.clone(),
      AppError::Integration { .. } => "Upstream service failed".to_string(),
      AppError::Database(_) => "Database operation failed".to_string(),
      AppError::Flow { .. } => "Workflow processing error".to_string(),
      AppError::Config(_) => "Configuration issue".to_string(),
      AppError::Internal(_) => "An internal error occurred".to_string(),
    };
    HttpResponse::build(status).json(json!({ "error": message }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
