// storefront/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Order, OrderDetail, OrderFilter, OrderStatus};
use crate::services::carrier::PackageDimensions;
use crate::services::order_status::{Actor, StatusMeta};
use crate::state::AppState;
use crate::web::extractors::{AdminUser, AuthenticatedUser};
use crate::web::respond;

async fn order_detail(app_state: &AppState, order: Order) -> Result<OrderDetail, AppError> {
  let items = app_state.repos.orders.order_items(order.id).await?;
  let timeline = app_state.repos.orders.timeline(order.id).await?;
  Ok(OrderDetail { order, items, timeline })
}

/// The caller's own order. Other users' orders are reported as missing.
async fn owned_order(app_state: &AppState, user: &AuthenticatedUser, order_id: Uuid) -> Result<Order, AppError> {
  match app_state.repos.orders.find_order(order_id).await? {
    Some(order) if order.user_id == user.user_id => Ok(order),
    Some(_) => {
      warn!(order_id = %order_id, "Order requested by a user who does not own it.");
      Err(AppError::NotFound(format!("Order {} not found", order_id)))
    }
    None => Err(AppError::NotFound(format!("Order {} not found", order_id))),
  }
}

async fn admin_order(app_state: &AppState, order_id: Uuid) -> Result<Order, AppError> {
  app_state
    .repos
    .orders
    .find_order(order_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))
}

// --- Customer ---

#[instrument(name = "handler::list_my_orders", skip(app_state, user), fields(user_id = %user.user_id))]
pub async fn list_my_orders_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let orders = app_state.repos.orders.list_orders_for_user(user.user_id).await?;
  info!("Fetched {} orders.", orders.len());
  Ok(respond::ok(orders))
}

#[instrument(name = "handler::get_my_order", skip(app_state, path, user), fields(user_id = %user.user_id, order_id = %path.as_ref()))]
pub async fn get_my_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let order = owned_order(&app_state, &user, path.into_inner()).await?;
  Ok(respond::ok(order_detail(&app_state, order).await?))
}

#[instrument(name = "handler::track_my_order", skip(app_state, path, user), fields(user_id = %user.user_id, order_id = %path.as_ref()))]
pub async fn track_my_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let order = owned_order(&app_state, &user, path.into_inner()).await?;
  match order.shipment.awb_code.as_deref() {
    Some(awb_code) => Ok(respond::ok(app_state.shipping.track_by_awb(awb_code).await?)),
    None => Ok(respond::ok(json!({
      "awb_code": null,
      "current_status": "unknown",
      "carrier_status": null,
      "timeline": [],
      "tracking_url": null,
      "etd": null,
    }))),
  }
}

// --- Admin ---

#[instrument(name = "handler::admin_list_orders", skip(app_state, query, _admin))]
pub async fn admin_list_orders_handler(
  app_state: web::Data<AppState>,
  query: web::Query<OrderFilter>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  Ok(respond::ok(app_state.repos.orders.list_orders(&query).await?))
}

#[instrument(name = "handler::admin_get_order", skip(app_state, path, _admin), fields(order_id = %path.as_ref()))]
pub async fn admin_get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let order = admin_order(&app_state, path.into_inner()).await?;
  Ok(respond::ok(order_detail(&app_state, order).await?))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdatePayload {
  pub status: OrderStatus,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub location: Option<String>,
}

#[instrument(
  name = "handler::update_order_status",
  skip(app_state, path, body, admin),
  fields(admin_id = %admin.user_id, order_id = %path.as_ref(), new_status = %body.status)
)]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  body: web::Json<StatusUpdatePayload>,
  admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let payload = body.into_inner();
  let order = app_state
    .status
    .update_status(
      &Actor::User(admin.0),
      order_id,
      payload.status,
      StatusMeta {
        description: payload.description,
        location: payload.location,
      },
    )
    .await?;
  Ok(respond::ok(order_detail(&app_state, order).await?))
}

/// An empty body ships with the default parcel; anything else must parse.
fn package_from_body(body: &[u8]) -> Result<PackageDimensions, AppError> {
  if body.iter().all(u8::is_ascii_whitespace) {
    return Ok(PackageDimensions::default());
  }
  let package: PackageDimensions = serde_json::from_slice(body)
    .map_err(|e| AppError::Validation(format!("Invalid package dimensions: {}", e)))?;
  let sizes = [package.weight_kg, package.length_cm, package.breadth_cm, package.height_cm];
  if sizes.iter().any(|v| !v.is_finite() || *v <= 0.0) {
    return Err(AppError::Validation("Package dimensions must be positive".to_string()));
  }
  Ok(package)
}

#[instrument(name = "handler::create_shipment", skip(app_state, path, body, admin), fields(admin_id = %admin.user_id, order_id = %path.as_ref()))]
pub async fn create_shipment_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  body: web::Bytes,
  admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let package = package_from_body(&body)?;
  let order = app_state.shipping.create_shipment(path.into_inner(), package).await?;
  info!(awb_code = ?order.shipment.awb_code, "Shipment ready.");
  Ok(respond::ok(order))
}

#[instrument(name = "handler::generate_invoice", skip(app_state, path, _admin), fields(order_id = %path.as_ref()))]
pub async fn generate_invoice_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  Ok(respond::ok(app_state.shipping.invoice_order(path.into_inner()).await?))
}

#[instrument(name = "handler::sync_tracking", skip(app_state, path, _admin), fields(order_id = %path.as_ref()))]
pub async fn sync_tracking_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  Ok(respond::ok(app_state.shipping.sync_tracking(path.into_inner()).await?))
}
