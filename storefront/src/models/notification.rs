// storefront/src/models/notification.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Back-office notification shown on the admin dashboard.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Notification {
  pub id: Uuid,
  pub kind: String,
  pub title: String,
  pub message: String,
  pub order_id: Option<Uuid>,
  pub is_read: bool,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
  pub kind: String,
  pub title: String,
  pub message: String,
  pub order_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationFilter {
  #[serde(default)]
  pub unread_only: bool,
}
