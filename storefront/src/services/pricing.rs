// storefront/src/services/pricing.rs

//! Prices a cart from the catalog. Client-sent prices are never trusted.

use crate::db::CatalogRepository;
use crate::errors::{AppError, Result};
use crate::models::{NewOrderItem, Product};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItemInput {
  pub product_id: Uuid,
  pub quantity: i32,
  #[serde(default)]
  pub size: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PricedCart {
  pub lines: Vec<NewOrderItem>,
  pub total_cents: i64,
}

fn unavailable(product_id: Uuid) -> AppError {
  AppError::Validation(format!("Product {} is not available", product_id))
}

pub async fn price_cart(catalog: &dyn CatalogRepository, items: &[CartItemInput]) -> Result<PricedCart> {
  if items.is_empty() {
    return Err(AppError::Validation("Cart is empty".to_string()));
  }
  if items.iter().any(|item| item.quantity < 1) {
    return Err(AppError::Validation("Quantity must be at least 1".to_string()));
  }

  let mut ids: Vec<Uuid> = items.iter().map(|item| item.product_id).collect();
  ids.sort();
  ids.dedup();
  let products: HashMap<Uuid, Product> = catalog
    .products_by_ids(&ids)
    .await?
    .into_iter()
    .map(|p| (p.id, p))
    .collect();

  // Quantities requested across all lines, per product and per (product, size).
  let mut wanted_per_product: HashMap<Uuid, i64> = HashMap::new();
  let mut wanted_per_size: HashMap<(Uuid, String), i64> = HashMap::new();
  let mut lines = Vec::with_capacity(items.len());
  let mut total_cents: i64 = 0;

  for item in items {
    let product = products
      .get(&item.product_id)
      .filter(|p| p.is_active)
      .ok_or_else(|| unavailable(item.product_id))?;

    let sizes = catalog.product_sizes(product.id).await?;
    let size = item.size.as_deref().map(str::trim).filter(|s| !s.is_empty());
    match (sizes.is_empty(), size) {
      (false, None) => {
        return Err(AppError::Validation(format!("Select a size for {}", product.name)));
      }
      (false, Some(size)) => {
        let tracked = sizes
          .iter()
          .find(|s| s.size == size)
          .ok_or_else(|| AppError::Validation(format!("Size {} is not offered for {}", size, product.name)))?;
        let wanted = wanted_per_size.entry((product.id, size.to_string())).or_insert(0);
        *wanted += i64::from(item.quantity);
        if *wanted > i64::from(tracked.stock_quantity) {
          return Err(AppError::Validation(format!(
            "Insufficient stock for {} in size {}",
            product.name, size
          )));
        }
      }
      (true, _) => {}
    }

    let wanted = wanted_per_product.entry(product.id).or_insert(0);
    *wanted += i64::from(item.quantity);
    if *wanted > i64::from(product.stock_quantity) {
      return Err(AppError::Validation(format!("Insufficient stock for {}", product.name)));
    }

    let unit_price_cents = product.effective_price_cents();
    let line_total = unit_price_cents
      .checked_mul(i64::from(item.quantity))
      .ok_or_else(|| AppError::Validation("Order total is out of range".to_string()))?;
    total_cents = total_cents
      .checked_add(line_total)
      .ok_or_else(|| AppError::Validation("Order total is out of range".to_string()))?;

    lines.push(NewOrderItem {
      product_id: product.id,
      product_name: product.name.clone(),
      size: if sizes.is_empty() { None } else { size.map(str::to_string) },
      quantity: item.quantity,
      unit_price_cents,
    });
  }

  Ok(PricedCart { lines, total_cents })
}
