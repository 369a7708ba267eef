// storefront/src/models/product.rs

use crate::errors::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
  pub id: Uuid,
  pub name: String,
  pub slug: String,
  pub description: Option<String>,
  pub category_id: Option<Uuid>,
  pub price_cents: i64,
  pub discount_price_cents: Option<i64>,
  pub stock_quantity: i32,
  pub low_stock_threshold: i32,
  pub is_active: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Product {
  /// The discount price when it undercuts the list price, else the list price.
  pub fn effective_price_cents(&self) -> i64 {
    match self.discount_price_cents {
      Some(discount) if discount < self.price_cents => discount,
      _ => self.price_cents,
    }
  }

  pub fn is_low_stock(&self) -> bool {
    self.is_active && self.stock_quantity <= self.low_stock_threshold
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct ProductImage {
  pub id: Uuid,
  pub product_id: Uuid,
  pub url: String,
  pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct ProductSize {
  pub id: Uuid,
  pub product_id: Uuid,
  pub size: String,
  pub stock_quantity: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
  #[serde(flatten)]
  pub product: Product,
  pub effective_price_cents: i64,
  pub images: Vec<ProductImage>,
  pub sizes: Vec<ProductSize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
  pub name: String,
  pub slug: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub category_id: Option<Uuid>,
  pub price_cents: i64,
  #[serde(default)]
  pub discount_price_cents: Option<i64>,
  #[serde(default)]
  pub stock_quantity: i32,
  #[serde(default = "default_low_stock_threshold")]
  pub low_stock_threshold: i32,
  #[serde(default = "default_active")]
  pub is_active: bool,
}

fn default_low_stock_threshold() -> i32 {
  5
}

fn default_active() -> bool {
  true
}

impl ProductInput {
  pub fn validate(&self) -> Result<(), AppError> {
    if self.name.trim().is_empty() {
      return Err(AppError::Validation("Product name is required".to_string()));
    }
    validate_slug(&self.slug)?;
    if self.price_cents < 0 {
      return Err(AppError::Validation("Price cannot be negative".to_string()));
    }
    if matches!(self.discount_price_cents, Some(d) if d < 0) {
      return Err(AppError::Validation("Discount price cannot be negative".to_string()));
    }
    if self.stock_quantity < 0 || self.low_stock_threshold < 0 {
      return Err(AppError::Validation("Stock values cannot be negative".to_string()));
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SizeInput {
  pub size: String,
  pub stock_quantity: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
  /// Category slug.
  pub category: Option<String>,
  /// Case-insensitive substring of the product name.
  pub search: Option<String>,
  pub limit: Option<i64>,
  pub offset: Option<i64>,
  #[serde(skip)]
  pub include_inactive: bool,
}

impl ProductFilter {
  pub const DEFAULT_LIMIT: i64 = 24;
  pub const MAX_LIMIT: i64 = 100;

  pub fn page(&self) -> (i64, i64) {
    let limit = self.limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, Self::MAX_LIMIT);
    let offset = self.offset.unwrap_or(0).max(0);
    (limit, offset)
  }
}

pub(crate) fn validate_slug(slug: &str) -> Result<(), AppError> {
  let valid = !slug.is_empty()
    && slug
      .chars()
      .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
  if valid {
    Ok(())
  } else {
    Err(AppError::Validation(format!(
      "Invalid slug '{}': use lowercase letters, digits and hyphens",
      slug
    )))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn product(price: i64, discount: Option<i64>) -> Product {
    Product {
      id: Uuid::new_v4(),
      name: "Linen kurta".into(),
      slug: "linen-kurta".into(),
      description: None,
      category_id: None,
      price_cents: price,
      discount_price_cents: discount,
      stock_quantity: 3,
      low_stock_threshold: 5,
      is_active: true,
      created_at: Utc::now(),
      updated_at: Utc::now(),
    }
  }

  #[test]
  fn effective_price_uses_lower_discount_only() {
    assert_eq!(product(2499, None).effective_price_cents(), 2499);
    assert_eq!(product(2499, Some(1999)).effective_price_cents(), 1999);
    assert_eq!(product(2499, Some(2999)).effective_price_cents(), 2499);
  }

  #[test]
  fn low_stock_is_inclusive_of_threshold() {
    let mut p = product(100, None);
    p.stock_quantity = 5;
    assert!(p.is_low_stock());
    p.stock_quantity = 6;
    assert!(!p.is_low_stock());
  }

  #[test]
  fn page_is_clamped() {
    let filter = ProductFilter {
      limit: Some(1000),
      offset: Some(-4),
      ..Default::default()
    };
    assert_eq!(filter.page(), (ProductFilter::MAX_LIMIT, 0));
  }

  #[test]
  fn slugs_are_checked() {
    assert!(validate_slug("summer-sale-2024").is_ok());
    assert!(validate_slug("Summer Sale").is_err());
    assert!(validate_slug("").is_err());
  }
}
