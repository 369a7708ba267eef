// storefront/src/models/wishlist.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Wishlist row joined with a summary of its product.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WishlistItem {
  pub id: Uuid,
  pub product_id: Uuid,
  pub product_name: String,
  pub product_slug: String,
  pub price_cents: i64,
  pub discount_price_cents: Option<i64>,
  pub image_url: Option<String>,
  pub created_at: DateTime<Utc>,
}
