// storefront/src/web/handlers/content_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{BannerInput, NotificationFilter, QueryFilter, QueryStatus};
use crate::state::AppState;
use crate::web::extractors::AdminUser;
use crate::web::respond;

#[instrument(name = "handler::list_banners", skip(app_state))]
pub async fn list_banners_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  Ok(respond::ok(app_state.repos.content.list_banners(false).await?))
}

#[instrument(name = "handler::admin_list_banners", skip(app_state, _admin))]
pub async fn admin_list_banners_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  Ok(respond::ok(app_state.repos.content.list_banners(true).await?))
}

#[instrument(name = "handler::create_banner", skip(app_state, body, _admin))]
pub async fn create_banner_handler(
  app_state: web::Data<AppState>,
  body: web::Json<BannerInput>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  body.validate()?;
  Ok(respond::created(app_state.repos.content.create_banner(&body).await?))
}

#[instrument(name = "handler::update_banner", skip(app_state, path, body, _admin), fields(banner_id = %path.as_ref()))]
pub async fn update_banner_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  body: web::Json<BannerInput>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  body.validate()?;
  Ok(respond::ok(
    app_state.repos.content.update_banner(path.into_inner(), &body).await?,
  ))
}

#[instrument(name = "handler::delete_banner", skip(app_state, path, _admin), fields(banner_id = %path.as_ref()))]
pub async fn delete_banner_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  app_state.repos.content.delete_banner(path.into_inner()).await?;
  Ok(respond::deleted())
}

// --- Customisation queries ---

#[instrument(name = "handler::list_customisation_queries", skip(app_state, query, _admin))]
pub async fn list_queries_handler(
  app_state: web::Data<AppState>,
  query: web::Query<QueryFilter>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  Ok(respond::ok(app_state.repos.content.list_queries(&query).await?))
}

#[derive(Debug, Deserialize)]
pub struct QueryStatusPayload {
  pub status: QueryStatus,
}

#[instrument(
  name = "handler::update_customisation_query",
  skip(app_state, path, body, _admin),
  fields(query_id = %path.as_ref(), status = ?body.status)
)]
pub async fn update_query_status_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  body: web::Json<QueryStatusPayload>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let query = app_state
    .repos
    .content
    .update_query_status(path.into_inner(), body.status)
    .await?;
  Ok(respond::ok(query))
}

#[instrument(name = "handler::delete_customisation_query", skip(app_state, path, _admin), fields(query_id = %path.as_ref()))]
pub async fn delete_query_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  app_state.repos.content.delete_query(path.into_inner()).await?;
  Ok(respond::deleted())
}

// --- Notifications ---

#[instrument(name = "handler::list_notifications", skip(app_state, query, _admin), fields(unread_only = query.unread_only))]
pub async fn list_notifications_handler(
  app_state: web::Data<AppState>,
  query: web::Query<NotificationFilter>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  Ok(respond::ok(app_state.repos.content.list_notifications(&query).await?))
}

#[instrument(name = "handler::mark_notification_read", skip(app_state, path, _admin), fields(notification_id = %path.as_ref()))]
pub async fn mark_notification_read_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  Ok(respond::ok(
    app_state.repos.content.mark_notification_read(path.into_inner()).await?,
  ))
}

#[instrument(name = "handler::mark_all_notifications_read", skip(app_state, _admin))]
pub async fn mark_all_notifications_read_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let updated = app_state.repos.content.mark_all_notifications_read().await?;
  info!("Marked {} notifications as read.", updated);
  Ok(respond::ok(json!({ "updated": updated })))
}

// --- Dashboard ---

#[instrument(name = "handler::dashboard", skip(app_state, admin), fields(admin_id = %admin.user_id))]
pub async fn dashboard_handler(app_state: web::Data<AppState>, admin: AdminUser) -> Result<HttpResponse, AppError> {
  Ok(respond::ok(app_state.repos.content.dashboard_stats().await?))
}
