// storefront/src/db/postgres/orders.rs

use super::{not_found, on_unique_violation, PgStore};
use crate::db::OrderRepository;
use crate::errors::{AppError, Result};
use crate::models::{NewOrder, Order, OrderFilter, OrderItem, OrderStatus, ShipmentPatch, StatusChange, TimelineEntry};
use async_trait::async_trait;
use tracing::{instrument, warn};
use uuid::Uuid;

const ORDER_COLUMNS: &str = "id, user_id, status, total_amount_cents, currency, \
  shipping_name, shipping_phone, shipping_line1, shipping_line2, shipping_city, shipping_state, \
  shipping_postcode, shipping_country, payment_gateway_order_id, payment_id, \
  carrier_order_id, shipment_id, awb_code, courier_name, tracking_url, pickup_token, label_url, invoice_url, \
  created_at, updated_at, shipped_at, delivered_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, product_name, size, quantity, unit_price_cents";

const TIMELINE_COLUMNS: &str = "id, order_id, status, description, location, created_at";

const DEFAULT_ORDER_PAGE: i64 = 50;
const MAX_ORDER_PAGE: i64 = 200;

#[async_trait]
impl OrderRepository for PgStore {
  #[instrument(name = "pg::create_order", skip(self, new_order), fields(user_id = %new_order.user_id, items = new_order.items.len()), err(Display))]
  async fn create_order(&self, new_order: NewOrder) -> Result<Order> {
    let mut tx = self.pool.begin().await?;

    let insert_sql = format!(
      "INSERT INTO orders (user_id, status, total_amount_cents, currency, shipping_name, shipping_phone, \
       shipping_line1, shipping_line2, shipping_city, shipping_state, shipping_postcode, shipping_country, \
       payment_gateway_order_id, payment_id) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) RETURNING {}",
      ORDER_COLUMNS
    );
    let address = &new_order.shipping_address;
    let order: Order = sqlx::query_as(&insert_sql)
      .bind(new_order.user_id)
      .bind(new_order.status)
      .bind(new_order.total_amount_cents)
      .bind(&new_order.currency)
      .bind(&address.full_name)
      .bind(&address.phone)
      .bind(&address.line1)
      .bind(&address.line2)
      .bind(&address.city)
      .bind(&address.state)
      .bind(&address.postcode)
      .bind(&address.country)
      .bind(&new_order.payment_gateway_order_id)
      .bind(&new_order.payment_id)
      .fetch_one(&mut *tx)
      .await
      .map_err(|e| {
        on_unique_violation(e, || {
          AppError::Conflict("An order was already recorded for this payment".to_string())
        })
      })?;

    for item in &new_order.items {
      let decremented = sqlx::query(
        "UPDATE products SET stock_quantity = stock_quantity - $2, updated_at = now() \
         WHERE id = $1 AND stock_quantity >= $2",
      )
      .bind(item.product_id)
      .bind(item.quantity)
      .execute(&mut *tx)
      .await?;
      if decremented.rows_affected() == 0 {
        warn!(product_id = %item.product_id, "Stock check failed while persisting order.");
        return Err(AppError::Validation(format!("Insufficient stock for {}", item.product_name)));
      }

      if let Some(size) = &item.size {
        let size_decremented = sqlx::query(
          "UPDATE product_sizes SET stock_quantity = stock_quantity - $3 \
           WHERE product_id = $1 AND size = $2 AND stock_quantity >= $3",
        )
        .bind(item.product_id)
        .bind(size)
        .bind(item.quantity)
        .execute(&mut *tx)
        .await?;
        if size_decremented.rows_affected() == 0 {
          let size_tracked: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM product_sizes WHERE product_id = $1 AND size = $2)")
              .bind(item.product_id)
              .bind(size)
              .fetch_one(&mut *tx)
              .await?;
          if size_tracked {
            return Err(AppError::Validation(format!(
              "Insufficient stock for {} in size {}",
              item.product_name, size
            )));
          }
        }
      }

      sqlx::query(
        "INSERT INTO order_items (order_id, product_id, product_name, size, quantity, unit_price_cents) \
         VALUES ($1, $2, $3, $4, $5, $6)",
      )
      .bind(order.id)
      .bind(item.product_id)
      .bind(&item.product_name)
      .bind(&item.size)
      .bind(item.quantity)
      .bind(item.unit_price_cents)
      .execute(&mut *tx)
      .await?;
    }

    sqlx::query("INSERT INTO order_timeline (order_id, status, description) VALUES ($1, $2, $3)")
      .bind(order.id)
      .bind(order.status)
      .bind(&new_order.timeline_description)
      .execute(&mut *tx)
      .await?;

    tx.commit().await?;
    Ok(order)
  }

  async fn find_order(&self, order_id: Uuid) -> Result<Option<Order>> {
    let sql = format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS);
    Ok(sqlx::query_as(&sql).bind(order_id).fetch_optional(&self.pool).await?)
  }

  async fn find_order_by_awb(&self, awb_code: &str) -> Result<Option<Order>> {
    let sql = format!("SELECT {} FROM orders WHERE awb_code = $1", ORDER_COLUMNS);
    Ok(sqlx::query_as(&sql).bind(awb_code).fetch_optional(&self.pool).await?)
  }

  async fn list_orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>> {
    let sql = format!(
      "SELECT {} FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
      ORDER_COLUMNS
    );
    Ok(sqlx::query_as(&sql).bind(user_id).fetch_all(&self.pool).await?)
  }

  async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
    let limit = filter.limit.unwrap_or(DEFAULT_ORDER_PAGE).clamp(1, MAX_ORDER_PAGE);
    let offset = filter.offset.unwrap_or(0).max(0);
    let sql = format!(
      "SELECT {} FROM orders WHERE ($1::order_status_enum IS NULL OR status = $1) \
       ORDER BY created_at DESC LIMIT $2 OFFSET $3",
      ORDER_COLUMNS
    );
    Ok(
      sqlx::query_as(&sql)
        .bind(filter.status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?,
    )
  }

  async fn order_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>> {
    let sql = format!("SELECT {} FROM order_items WHERE order_id = $1 ORDER BY product_name", ITEM_COLUMNS);
    Ok(sqlx::query_as(&sql).bind(order_id).fetch_all(&self.pool).await?)
  }

  async fn timeline(&self, order_id: Uuid) -> Result<Vec<TimelineEntry>> {
    let sql = format!("SELECT {} FROM order_timeline WHERE order_id = $1 ORDER BY seq ASC", TIMELINE_COLUMNS);
    Ok(sqlx::query_as(&sql).bind(order_id).fetch_all(&self.pool).await?)
  }

  #[instrument(name = "pg::apply_status_change", skip(self, change), fields(order_id = %change.order_id, new_status = %change.new_status), err(Display))]
  async fn apply_status_change(&self, change: StatusChange) -> Result<Order> {
    let mut tx = self.pool.begin().await?;

    let update_sql = format!(
      "UPDATE orders SET status = $2, updated_at = now(), \
       shipped_at = CASE WHEN $4 THEN now() ELSE shipped_at END, \
       delivered_at = CASE WHEN $5 THEN now() ELSE delivered_at END \
       WHERE id = $1 AND status = $3 RETURNING {}",
      ORDER_COLUMNS
    );
    let updated: Option<Order> = sqlx::query_as(&update_sql)
      .bind(change.order_id)
      .bind(change.new_status)
      .bind(change.expected_status)
      .bind(change.new_status == OrderStatus::Shipped)
      .bind(change.new_status == OrderStatus::Delivered)
      .fetch_optional(&mut *tx)
      .await?;

    let Some(order) = updated else {
      let current: Option<OrderStatus> = sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
        .bind(change.order_id)
        .fetch_optional(&mut *tx)
        .await?;
      return Err(match current {
        None => not_found("Order", change.order_id),
        Some(status) => AppError::Conflict(format!(
          "Order {} changed status concurrently (now {})",
          change.order_id, status
        )),
      });
    };

    sqlx::query("INSERT INTO order_timeline (order_id, status, description, location) VALUES ($1, $2, $3, $4)")
      .bind(change.order_id)
      .bind(change.new_status)
      .bind(&change.description)
      .bind(&change.location)
      .execute(&mut *tx)
      .await?;

    tx.commit().await?;
    Ok(order)
  }

  async fn save_shipment_details(&self, order_id: Uuid, patch: &ShipmentPatch) -> Result<Order> {
    let sql = format!(
      "UPDATE orders SET \
       carrier_order_id = COALESCE($2, carrier_order_id), \
       shipment_id = COALESCE($3, shipment_id), \
       awb_code = COALESCE($4, awb_code), \
       courier_name = COALESCE($5, courier_name), \
       tracking_url = COALESCE($6, tracking_url), \
       pickup_token = COALESCE($7, pickup_token), \
       label_url = COALESCE($8, label_url), \
       invoice_url = COALESCE($9, invoice_url), \
       updated_at = now() \
       WHERE id = $1 RETURNING {}",
      ORDER_COLUMNS
    );
    let updated: Option<Order> = sqlx::query_as(&sql)
      .bind(order_id)
      .bind(&patch.carrier_order_id)
      .bind(&patch.shipment_id)
      .bind(&patch.awb_code)
      .bind(&patch.courier_name)
      .bind(&patch.tracking_url)
      .bind(&patch.pickup_token)
      .bind(&patch.label_url)
      .bind(&patch.invoice_url)
      .fetch_optional(&self.pool)
      .await?;
    updated.ok_or_else(|| not_found("Order", order_id))
  }
}
