// storefront/src/models/category.rs

use crate::errors::AppError;
use crate::models::product::validate_slug;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
  pub id: Uuid,
  pub name: String,
  pub slug: String,
  pub description: Option<String>,
  pub image_url: Option<String>,
  pub is_active: bool,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
  pub name: String,
  pub slug: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub image_url: Option<String>,
  #[serde(default = "default_active")]
  pub is_active: bool,
}

fn default_active() -> bool {
  true
}

impl CategoryInput {
  pub fn validate(&self) -> Result<(), AppError> {
    if self.name.trim().is_empty() {
      return Err(AppError::Validation("Category name is required".to_string()));
    }
    validate_slug(&self.slug)
  }
}
