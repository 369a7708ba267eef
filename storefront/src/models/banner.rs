// storefront/src/models/banner.rs

use crate::errors::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Banner {
  pub id: Uuid,
  pub title: String,
  pub subtitle: Option<String>,
  pub image_url: String,
  pub link_url: Option<String>,
  pub position: i32,
  pub is_active: bool,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BannerInput {
  pub title: String,
  #[serde(default)]
  pub subtitle: Option<String>,
  pub image_url: String,
  #[serde(default)]
  pub link_url: Option<String>,
  #[serde(default)]
  pub position: i32,
  #[serde(default = "default_active")]
  pub is_active: bool,
}

fn default_active() -> bool {
  true
}

impl BannerInput {
  pub fn validate(&self) -> Result<(), AppError> {
    if self.title.trim().is_empty() || self.image_url.trim().is_empty() {
      return Err(AppError::Validation("Banner title and image_url are required".to_string()));
    }
    Ok(())
  }
}
