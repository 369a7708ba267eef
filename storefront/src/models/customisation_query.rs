// storefront/src/models/customisation_query.rs

use crate::errors::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "query_status_enum", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
  New,
  InProgress,
  Resolved,
  Closed,
}

/// A customer's request for a made-to-measure or altered piece.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CustomisationQuery {
  pub id: Uuid,
  pub user_id: Option<Uuid>,
  pub name: String,
  pub email: String,
  pub phone: Option<String>,
  pub product_id: Option<Uuid>,
  pub message: String,
  pub status: QueryStatus,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomisationQueryInput {
  pub name: String,
  pub email: String,
  #[serde(default)]
  pub phone: Option<String>,
  #[serde(default)]
  pub product_id: Option<Uuid>,
  pub message: String,
}

impl CustomisationQueryInput {
  pub fn validate(&self) -> Result<(), AppError> {
    if self.name.trim().is_empty() || self.message.trim().is_empty() {
      return Err(AppError::Validation("Name and message are required".to_string()));
    }
    if !self.email.contains('@') {
      return Err(AppError::Validation("A valid email is required".to_string()));
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryFilter {
  pub status: Option<QueryStatus>,
}
