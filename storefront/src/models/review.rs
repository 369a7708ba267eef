// storefront/src/models/review.rs

use crate::errors::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Review {
  pub id: Uuid,
  pub product_id: Uuid,
  pub user_id: Uuid,
  pub rating: i16,
  pub title: Option<String>,
  pub comment: Option<String>,
  pub is_approved: bool,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewInput {
  pub rating: i16,
  #[serde(default)]
  pub title: Option<String>,
  #[serde(default)]
  pub comment: Option<String>,
}

impl ReviewInput {
  pub fn validate(&self) -> Result<(), AppError> {
    if !(1..=5).contains(&self.rating) {
      return Err(AppError::Validation("Rating must be between 1 and 5".to_string()));
    }
    Ok(())
  }
}

/// A validated review ready to insert. New reviews await moderation.
#[derive(Debug, Clone)]
pub struct NewReview {
  pub product_id: Uuid,
  pub user_id: Uuid,
  pub rating: i16,
  pub title: Option<String>,
  pub comment: Option<String>,
}
