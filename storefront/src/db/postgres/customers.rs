// storefront/src/db/postgres/customers.rs

use super::{not_found, on_foreign_key_violation, on_unique_violation, PgStore};
use crate::db::CustomerRepository;
use crate::errors::{AppError, Result};
use crate::models::{NewReview, Profile, ProfileUpdate, Review, Role, WishlistItem};
use async_trait::async_trait;
use uuid::Uuid;

const PROFILE_COLUMNS: &str = "id, full_name, email, phone, role, address_line1, address_line2, city, state, \
  postcode, country, created_at";

const REVIEW_COLUMNS: &str = "id, product_id, user_id, rating, title, comment, is_approved, created_at";

#[async_trait]
impl CustomerRepository for PgStore {
  async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
    let sql = format!("SELECT {} FROM profiles WHERE id = $1", PROFILE_COLUMNS);
    Ok(sqlx::query_as(&sql).bind(user_id).fetch_optional(&self.pool).await?)
  }

  async fn role_of(&self, user_id: Uuid) -> Result<Option<Role>> {
    Ok(
      sqlx::query_scalar("SELECT role FROM profiles WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<Profile> {
    let sql = format!(
      "UPDATE profiles SET full_name = COALESCE($2, full_name), email = COALESCE($3, email), \
       phone = COALESCE($4, phone), address_line1 = COALESCE($5, address_line1), \
       address_line2 = COALESCE($6, address_line2), city = COALESCE($7, city), state = COALESCE($8, state), \
       postcode = COALESCE($9, postcode), country = COALESCE($10, country) \
       WHERE id = $1 RETURNING {}",
      PROFILE_COLUMNS
    );
    let updated: Option<Profile> = sqlx::query_as(&sql)
      .bind(user_id)
      .bind(update.full_name)
      .bind(update.email)
      .bind(update.phone)
      .bind(update.address_line1)
      .bind(update.address_line2)
      .bind(update.city)
      .bind(update.state)
      .bind(update.postcode)
      .bind(update.country)
      .fetch_optional(&self.pool)
      .await?;
    updated.ok_or_else(|| not_found("Profile", user_id))
  }

  async fn list_wishlist(&self, user_id: Uuid) -> Result<Vec<WishlistItem>> {
    Ok(
      sqlx::query_as(
        "SELECT w.id, w.product_id, p.name AS product_name, p.slug AS product_slug, p.price_cents, \
         p.discount_price_cents, \
         (SELECT i.url FROM product_images i WHERE i.product_id = p.id ORDER BY i.position LIMIT 1) AS image_url, \
         w.created_at \
         FROM wishlist w JOIN products p ON p.id = w.product_id \
         WHERE w.user_id = $1 ORDER BY w.created_at DESC",
      )
      .bind(user_id)
      .fetch_all(&self.pool)
      .await?,
    )
  }

  async fn add_to_wishlist(&self, user_id: Uuid, product_id: Uuid) -> Result<bool> {
    let inserted = sqlx::query(
      "INSERT INTO wishlist (user_id, product_id) VALUES ($1, $2) ON CONFLICT (user_id, product_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(product_id)
    .execute(&self.pool)
    .await
    .map_err(|e| on_foreign_key_violation(e, || not_found("Product", product_id)))?;
    Ok(inserted.rows_affected() == 1)
  }

  async fn remove_from_wishlist(&self, user_id: Uuid, product_id: Uuid) -> Result<bool> {
    let removed = sqlx::query("DELETE FROM wishlist WHERE user_id = $1 AND product_id = $2")
      .bind(user_id)
      .bind(product_id)
      .execute(&self.pool)
      .await?;
    Ok(removed.rows_affected() > 0)
  }

  async fn list_product_reviews(&self, product_id: Uuid, approved_only: bool) -> Result<Vec<Review>> {
    let sql = format!(
      "SELECT {} FROM reviews WHERE product_id = $1 AND (NOT $2 OR is_approved) ORDER BY created_at DESC",
      REVIEW_COLUMNS
    );
    Ok(
      sqlx::query_as(&sql)
        .bind(product_id)
        .bind(approved_only)
        .fetch_all(&self.pool)
        .await?,
    )
  }

  async fn list_all_reviews(&self) -> Result<Vec<Review>> {
    let sql = format!("SELECT {} FROM reviews ORDER BY created_at DESC", REVIEW_COLUMNS);
    Ok(sqlx::query_as(&sql).fetch_all(&self.pool).await?)
  }

  async fn create_review(&self, review: NewReview) -> Result<Review> {
    let sql = format!(
      "INSERT INTO reviews (product_id, user_id, rating, title, comment) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
      REVIEW_COLUMNS
    );
    sqlx::query_as(&sql)
      .bind(review.product_id)
      .bind(review.user_id)
      .bind(review.rating)
      .bind(&review.title)
      .bind(&review.comment)
      .fetch_one(&self.pool)
      .await
      .map_err(|e| {
        on_unique_violation(e, || {
          AppError::Validation("You have already reviewed this product".to_string())
        })
      })
  }

  async fn set_review_approval(&self, review_id: Uuid, approved: bool) -> Result<Review> {
    let sql = format!("UPDATE reviews SET is_approved = $2 WHERE id = $1 RETURNING {}", REVIEW_COLUMNS);
    let updated: Option<Review> = sqlx::query_as(&sql)
      .bind(review_id)
      .bind(approved)
      .fetch_optional(&self.pool)
      .await?;
    updated.ok_or_else(|| not_found("Review", review_id))
  }

  async fn delete_review(&self, review_id: Uuid) -> Result<()> {
    let deleted = sqlx::query("DELETE FROM reviews WHERE id = $1")
      .bind(review_id)
      .execute(&self.pool)
      .await?;
    if deleted.rows_affected() == 0 {
      return Err(not_found("Review", review_id));
    }
    Ok(())
  }
}
