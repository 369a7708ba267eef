// storefront/src/db/postgres/catalog.rs

use super::{not_found, on_foreign_key_violation, on_unique_violation, PgStore};
use crate::db::CatalogRepository;
use crate::errors::{AppError, Result};
use crate::models::{Category, CategoryInput, Product, ProductFilter, ProductImage, ProductInput, ProductSize, SizeInput};
use async_trait::async_trait;
use uuid::Uuid;

const PRODUCT_COLUMNS: &str = "id, name, slug, description, category_id, price_cents, discount_price_cents, \
  stock_quantity, low_stock_threshold, is_active, created_at, updated_at";

const CATEGORY_COLUMNS: &str = "id, name, slug, description, image_url, is_active, created_at";

fn duplicate_slug(kind: &str, slug: &str) -> AppError {
  AppError::Conflict(format!("A {} with slug '{}' already exists", kind, slug))
}

#[async_trait]
impl CatalogRepository for PgStore {
  async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
    let (limit, offset) = filter.page();
    let sql = format!(
      "SELECT {} FROM products \
       WHERE ($1 OR is_active) \
       AND ($2::text IS NULL OR category_id IN (SELECT id FROM categories WHERE slug = $2)) \
       AND ($3::text IS NULL OR name ILIKE '%' || $3 || '%') \
       ORDER BY name ASC LIMIT $4 OFFSET $5",
      PRODUCT_COLUMNS
    );
    Ok(
      sqlx::query_as(&sql)
        .bind(filter.include_inactive)
        .bind(&filter.category)
        .bind(&filter.search)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?,
    )
  }

  async fn find_product(&self, product_id: Uuid) -> Result<Option<Product>> {
    let sql = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
    Ok(sqlx::query_as(&sql).bind(product_id).fetch_optional(&self.pool).await?)
  }

  async fn find_product_by_slug(&self, slug: &str) -> Result<Option<Product>> {
    let sql = format!("SELECT {} FROM products WHERE slug = $1", PRODUCT_COLUMNS);
    Ok(sqlx::query_as(&sql).bind(slug).fetch_optional(&self.pool).await?)
  }

  async fn products_by_ids(&self, product_ids: &[Uuid]) -> Result<Vec<Product>> {
    let sql = format!("SELECT {} FROM products WHERE id = ANY($1)", PRODUCT_COLUMNS);
    Ok(
      sqlx::query_as(&sql)
        .bind(product_ids.to_vec())
        .fetch_all(&self.pool)
        .await?,
    )
  }

  async fn product_images(&self, product_id: Uuid) -> Result<Vec<ProductImage>> {
    Ok(
      sqlx::query_as("SELECT id, product_id, url, position FROM product_images WHERE product_id = $1 ORDER BY position")
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?,
    )
  }

  async fn product_sizes(&self, product_id: Uuid) -> Result<Vec<ProductSize>> {
    Ok(
      sqlx::query_as(
        "SELECT id, product_id, size, stock_quantity FROM product_sizes WHERE product_id = $1 ORDER BY size",
      )
      .bind(product_id)
      .fetch_all(&self.pool)
      .await?,
    )
  }

  async fn create_product(&self, input: &ProductInput) -> Result<Product> {
    let sql = format!(
      "INSERT INTO products (name, slug, description, category_id, price_cents, discount_price_cents, \
       stock_quantity, low_stock_threshold, is_active) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
      PRODUCT_COLUMNS
    );
    sqlx::query_as(&sql)
      .bind(&input.name)
      .bind(&input.slug)
      .bind(&input.description)
      .bind(input.category_id)
      .bind(input.price_cents)
      .bind(input.discount_price_cents)
      .bind(input.stock_quantity)
      .bind(input.low_stock_threshold)
      .bind(input.is_active)
      .fetch_one(&self.pool)
      .await
      .map_err(|e| on_unique_violation(e, || duplicate_slug("product", &input.slug)))
  }

  async fn update_product(&self, product_id: Uuid, input: &ProductInput) -> Result<Product> {
    let sql = format!(
      "UPDATE products SET name = $2, slug = $3, description = $4, category_id = $5, price_cents = $6, \
       discount_price_cents = $7, stock_quantity = $8, low_stock_threshold = $9, is_active = $10, updated_at = now() \
       WHERE id = $1 RETURNING {}",
      PRODUCT_COLUMNS
    );
    let updated: Option<Product> = sqlx::query_as(&sql)
      .bind(product_id)
      .bind(&input.name)
      .bind(&input.slug)
      .bind(&input.description)
      .bind(input.category_id)
      .bind(input.price_cents)
      .bind(input.discount_price_cents)
      .bind(input.stock_quantity)
      .bind(input.low_stock_threshold)
      .bind(input.is_active)
      .fetch_optional(&self.pool)
      .await
      .map_err(|e| on_unique_violation(e, || duplicate_slug("product", &input.slug)))?;
    updated.ok_or_else(|| not_found("Product", product_id))
  }

  async fn delete_product(&self, product_id: Uuid) -> Result<()> {
    let deleted = sqlx::query("DELETE FROM products WHERE id = $1")
      .bind(product_id)
      .execute(&self.pool)
      .await
      .map_err(|e| {
        on_foreign_key_violation(e, || {
          AppError::Validation("Product is referenced by orders; deactivate it instead".to_string())
        })
      })?;
    if deleted.rows_affected() == 0 {
      return Err(not_found("Product", product_id));
    }
    Ok(())
  }

  async fn replace_images(&self, product_id: Uuid, urls: &[String]) -> Result<Vec<ProductImage>> {
    let mut tx = self.pool.begin().await?;
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)")
      .bind(product_id)
      .fetch_one(&mut *tx)
      .await?;
    if !exists {
      return Err(not_found("Product", product_id));
    }
    sqlx::query("DELETE FROM product_images WHERE product_id = $1")
      .bind(product_id)
      .execute(&mut *tx)
      .await?;
    let mut images = Vec::with_capacity(urls.len());
    for (position, url) in urls.iter().enumerate() {
      let image: ProductImage = sqlx::query_as(
        "INSERT INTO product_images (product_id, url, position) VALUES ($1, $2, $3) \
         RETURNING id, product_id, url, position",
      )
      .bind(product_id)
      .bind(url)
      .bind(position as i32)
      .fetch_one(&mut *tx)
      .await?;
      images.push(image);
    }
    tx.commit().await?;
    Ok(images)
  }

  async fn replace_sizes(&self, product_id: Uuid, sizes: &[SizeInput]) -> Result<Vec<ProductSize>> {
    let mut tx = self.pool.begin().await?;
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)")
      .bind(product_id)
      .fetch_one(&mut *tx)
      .await?;
    if !exists {
      return Err(not_found("Product", product_id));
    }
    sqlx::query("DELETE FROM product_sizes WHERE product_id = $1")
      .bind(product_id)
      .execute(&mut *tx)
      .await?;
    let mut rows = Vec::with_capacity(sizes.len());
    for size in sizes {
      let row: ProductSize = sqlx::query_as(
        "INSERT INTO product_sizes (product_id, size, stock_quantity) VALUES ($1, $2, $3) \
         RETURNING id, product_id, size, stock_quantity",
      )
      .bind(product_id)
      .bind(&size.size)
      .bind(size.stock_quantity)
      .fetch_one(&mut *tx)
      .await
      .map_err(|e| on_unique_violation(e, || AppError::Validation(format!("Size '{}' listed twice", size.size))))?;
      rows.push(row);
    }
    tx.commit().await?;
    Ok(rows)
  }

  async fn list_categories(&self, include_inactive: bool) -> Result<Vec<Category>> {
    let sql = format!(
      "SELECT {} FROM categories WHERE ($1 OR is_active) ORDER BY name ASC",
      CATEGORY_COLUMNS
    );
    Ok(sqlx::query_as(&sql).bind(include_inactive).fetch_all(&self.pool).await?)
  }

  async fn create_category(&self, input: &CategoryInput) -> Result<Category> {
    let sql = format!(
      "INSERT INTO categories (name, slug, description, image_url, is_active) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
      CATEGORY_COLUMNS
    );
    sqlx::query_as(&sql)
      .bind(&input.name)
      .bind(&input.slug)
      .bind(&input.description)
      .bind(&input.image_url)
      .bind(input.is_active)
      .fetch_one(&self.pool)
      .await
      .map_err(|e| on_unique_violation(e, || duplicate_slug("category", &input.slug)))
  }

  async fn update_category(&self, category_id: Uuid, input: &CategoryInput) -> Result<Category> {
    let sql = format!(
      "UPDATE categories SET name = $2, slug = $3, description = $4, image_url = $5, is_active = $6 \
       WHERE id = $1 RETURNING {}",
      CATEGORY_COLUMNS
    );
    let updated: Option<Category> = sqlx::query_as(&sql)
      .bind(category_id)
      .bind(&input.name)
      .bind(&input.slug)
      .bind(&input.description)
      .bind(&input.image_url)
      .bind(input.is_active)
      .fetch_optional(&self.pool)
      .await
      .map_err(|e| on_unique_violation(e, || duplicate_slug("category", &input.slug)))?;
    updated.ok_or_else(|| not_found("Category", category_id))
  }

  async fn delete_category(&self, category_id: Uuid) -> Result<()> {
    let deleted = sqlx::query("DELETE FROM categories WHERE id = $1")
      .bind(category_id)
      .execute(&self.pool)
      .await?;
    if deleted.rows_affected() == 0 {
      return Err(not_found("Category", category_id));
    }
    Ok(())
  }
}
