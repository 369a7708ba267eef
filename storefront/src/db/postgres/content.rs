// storefront/src/db/postgres/content.rs

use super::{not_found, PgStore};
use crate::db::ContentRepository;
use crate::errors::Result;
use crate::models::{
  Banner, BannerInput, CustomisationQuery, CustomisationQueryInput, DashboardStats, NewNotification, Notification,
  NotificationFilter, QueryFilter, QueryStatus,
};
use async_trait::async_trait;
use uuid::Uuid;

const BANNER_COLUMNS: &str = "id, title, subtitle, image_url, link_url, position, is_active, created_at";

const QUERY_COLUMNS: &str = "id, user_id, name, email, phone, product_id, message, status, created_at";

const NOTIFICATION_COLUMNS: &str = "id, kind, title, message, order_id, is_read, created_at";

#[async_trait]
impl ContentRepository for PgStore {
  async fn list_banners(&self, include_inactive: bool) -> Result<Vec<Banner>> {
    let sql = format!(
      "SELECT {} FROM banners WHERE ($1 OR is_active) ORDER BY position ASC, created_at ASC",
      BANNER_COLUMNS
    );
    Ok(sqlx::query_as(&sql).bind(include_inactive).fetch_all(&self.pool).await?)
  }

  async fn create_banner(&self, input: &BannerInput) -> Result<Banner> {
    let sql = format!(
      "INSERT INTO banners (title, subtitle, image_url, link_url, position, is_active) \
       VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
      BANNER_COLUMNS
    );
    Ok(
      sqlx::query_as(&sql)
        .bind(&input.title)
        .bind(&input.subtitle)
        .bind(&input.image_url)
        .bind(&input.link_url)
        .bind(input.position)
        .bind(input.is_active)
        .fetch_one(&self.pool)
        .await?,
    )
  }

  async fn update_banner(&self, banner_id: Uuid, input: &BannerInput) -> Result<Banner> {
    let sql = format!(
      "UPDATE banners SET title = $2, subtitle = $3, image_url = $4, link_url = $5, position = $6, is_active = $7 \
       WHERE id = $1 RETURNING {}",
      BANNER_COLUMNS
    );
    let updated: Option<Banner> = sqlx::query_as(&sql)
      .bind(banner_id)
      .bind(&input.title)
      .bind(&input.subtitle)
      .bind(&input.image_url)
      .bind(&input.link_url)
      .bind(input.position)
      .bind(input.is_active)
      .fetch_optional(&self.pool)
      .await?;
    updated.ok_or_else(|| not_found("Banner", banner_id))
  }

  async fn delete_banner(&self, banner_id: Uuid) -> Result<()> {
    let deleted = sqlx::query("DELETE FROM banners WHERE id = $1")
      .bind(banner_id)
      .execute(&self.pool)
      .await?;
    if deleted.rows_affected() == 0 {
      return Err(not_found("Banner", banner_id));
    }
    Ok(())
  }

  async fn create_query(&self, user_id: Option<Uuid>, input: &CustomisationQueryInput) -> Result<CustomisationQuery> {
    let sql = format!(
      "INSERT INTO customisation_queries (user_id, name, email, phone, product_id, message) \
       VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
      QUERY_COLUMNS
    );
    Ok(
      sqlx::query_as(&sql)
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(input.product_id)
        .bind(&input.message)
        .fetch_one(&self.pool)
        .await?,
    )
  }

  async fn list_queries(&self, filter: &QueryFilter) -> Result<Vec<CustomisationQuery>> {
    let sql = format!(
      "SELECT {} FROM customisation_queries WHERE ($1::query_status_enum IS NULL OR status = $1) \
       ORDER BY created_at DESC",
      QUERY_COLUMNS
    );
    Ok(sqlx::query_as(&sql).bind(filter.status).fetch_all(&self.pool).await?)
  }

  async fn update_query_status(&self, query_id: Uuid, status: QueryStatus) -> Result<CustomisationQuery> {
    let sql = format!(
      "UPDATE customisation_queries SET status = $2 WHERE id = $1 RETURNING {}",
      QUERY_COLUMNS
    );
    let updated: Option<CustomisationQuery> = sqlx::query_as(&sql)
      .bind(query_id)
      .bind(status)
      .fetch_optional(&self.pool)
      .await?;
    updated.ok_or_else(|| not_found("Customisation query", query_id))
  }

  async fn delete_query(&self, query_id: Uuid) -> Result<()> {
    let deleted = sqlx::query("DELETE FROM customisation_queries WHERE id = $1")
      .bind(query_id)
      .execute(&self.pool)
      .await?;
    if deleted.rows_affected() == 0 {
      return Err(not_found("Customisation query", query_id));
    }
    Ok(())
  }

  async fn create_notification(&self, notification: NewNotification) -> Result<Notification> {
    let sql = format!(
      "INSERT INTO notifications (kind, title, message, order_id) VALUES ($1, $2, $3, $4) RETURNING {}",
      NOTIFICATION_COLUMNS
    );
    Ok(
      sqlx::query_as(&sql)
        .bind(&notification.kind)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.order_id)
        .fetch_one(&self.pool)
        .await?,
    )
  }

  async fn list_notifications(&self, filter: &NotificationFilter) -> Result<Vec<Notification>> {
    let sql = format!(
      "SELECT {} FROM notifications WHERE (NOT $1 OR NOT is_read) ORDER BY created_at DESC",
      NOTIFICATION_COLUMNS
    );
    Ok(sqlx::query_as(&sql).bind(filter.unread_only).fetch_all(&self.pool).await?)
  }

  async fn mark_notification_read(&self, notification_id: Uuid) -> Result<Notification> {
    let sql = format!(
      "UPDATE notifications SET is_read = TRUE WHERE id = $1 RETURNING {}",
      NOTIFICATION_COLUMNS
    );
    let updated: Option<Notification> = sqlx::query_as(&sql)
      .bind(notification_id)
      .fetch_optional(&self.pool)
      .await?;
    updated.ok_or_else(|| not_found("Notification", notification_id))
  }

  async fn mark_all_notifications_read(&self) -> Result<u64> {
    let updated = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE NOT is_read")
      .execute(&self.pool)
      .await?;
    Ok(updated.rows_affected())
  }

  async fn dashboard_stats(&self) -> Result<DashboardStats> {
    let (total_orders, pending_orders, revenue_cents, low_stock, unread_notifications, total_customers): (
      i64,
      i64,
      i64,
      i64,
      i64,
      i64,
    ) = sqlx::query_as(
      "SELECT \
       (SELECT COUNT(*) FROM orders), \
       (SELECT COUNT(*) FROM orders WHERE status IN ('pending', 'confirmed', 'processing')), \
       (SELECT COALESCE(SUM(total_amount_cents), 0)::BIGINT FROM orders WHERE status NOT IN ('cancelled', 'refunded')), \
       (SELECT COUNT(*) FROM products WHERE is_active AND stock_quantity <= low_stock_threshold), \
       (SELECT COUNT(*) FROM notifications WHERE NOT is_read), \
       (SELECT COUNT(*) FROM profiles WHERE role = 'customer')",
    )
    .fetch_one(&self.pool)
    .await?;
    Ok(DashboardStats {
      total_orders,
      pending_orders,
      revenue_cents,
      low_stock,
      unread_notifications,
      total_customers,
    })
  }
}
