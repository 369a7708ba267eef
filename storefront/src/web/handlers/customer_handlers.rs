// storefront/src/web/handlers/customer_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{CustomisationQueryInput, NewReview, ProfileUpdate, ReviewInput};
use crate::state::AppState;
use crate::web::extractors::{AdminUser, AuthenticatedUser};
use crate::web::respond;

// --- Profile ---

#[instrument(name = "handler::get_profile", skip(app_state, user), fields(user_id = %user.user_id))]
pub async fn get_profile_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let profile = app_state
    .repos
    .customers
    .find_profile(user.user_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;
  Ok(respond::ok(profile))
}

#[instrument(name = "handler::update_profile", skip(app_state, body, user), fields(user_id = %user.user_id))]
pub async fn update_profile_handler(
  app_state: web::Data<AppState>,
  body: web::Json<ProfileUpdate>,
  user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let profile = app_state
    .repos
    .customers
    .update_profile(user.user_id, body.into_inner())
    .await?;
  info!("Profile updated.");
  Ok(respond::ok(profile))
}

// --- Wishlist ---

#[instrument(name = "handler::list_wishlist", skip(app_state, user), fields(user_id = %user.user_id))]
pub async fn list_wishlist_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  Ok(respond::ok(app_state.repos.customers.list_wishlist(user.user_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct WishlistPayload {
  pub product_id: Uuid,
}

#[instrument(
  name = "handler::add_to_wishlist",
  skip(app_state, body, user),
  fields(user_id = %user.user_id, product_id = %body.product_id)
)]
pub async fn add_to_wishlist_handler(
  app_state: web::Data<AppState>,
  body: web::Json<WishlistPayload>,
  user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let product_exists = app_state
    .repos
    .catalog
    .find_product(body.product_id)
    .await?
    .map_or(false, |p| p.is_active);
  if !product_exists {
    return Err(AppError::NotFound(format!("Product {} not found", body.product_id)));
  }

  let added = app_state
    .repos
    .customers
    .add_to_wishlist(user.user_id, body.product_id)
    .await?;
  if added {
    info!("Product added to wishlist.");
    Ok(respond::created(json!({ "added": true, "message": "Added to wishlist" })))
  } else {
    Ok(respond::ok(json!({ "added": false, "message": "Already in wishlist" })))
  }
}

#[instrument(name = "handler::remove_from_wishlist", skip(app_state, path, user), fields(user_id = %user.user_id))]
pub async fn remove_from_wishlist_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  if !app_state
    .repos
    .customers
    .remove_from_wishlist(user.user_id, product_id)
    .await?
  {
    return Err(AppError::NotFound("Product is not in the wishlist".to_string()));
  }
  Ok(respond::ok(json!({ "removed": true })))
}

// --- Reviews ---

#[instrument(name = "handler::product_reviews", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn product_reviews_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let reviews = app_state
    .repos
    .customers
    .list_product_reviews(path.into_inner(), true)
    .await?;
  Ok(respond::ok(reviews))
}

#[instrument(
  name = "handler::create_review",
  skip(app_state, path, body, user),
  fields(user_id = %user.user_id, product_id = %path.as_ref())
)]
pub async fn create_review_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  body: web::Json<ReviewInput>,
  user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  body.validate()?;
  let product_id = path.into_inner();
  if app_state.repos.catalog.find_product(product_id).await?.is_none() {
    return Err(AppError::NotFound(format!("Product {} not found", product_id)));
  }
  let input = body.into_inner();
  let review = app_state
    .repos
    .customers
    .create_review(NewReview {
      product_id,
      user_id: user.user_id,
      rating: input.rating,
      title: input.title,
      comment: input.comment,
    })
    .await?;
  info!(review_id = %review.id, "Review submitted for moderation.");
  Ok(respond::created(review))
}

#[instrument(name = "handler::admin_list_reviews", skip(app_state, _admin))]
pub async fn admin_list_reviews_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  Ok(respond::ok(app_state.repos.customers.list_all_reviews().await?))
}

#[derive(Debug, Deserialize)]
pub struct ApprovalPayload {
  pub approved: bool,
}

#[instrument(name = "handler::set_review_approval", skip(app_state, path, body, _admin), fields(review_id = %path.as_ref()))]
pub async fn set_review_approval_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  body: web::Json<ApprovalPayload>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let review = app_state
    .repos
    .customers
    .set_review_approval(path.into_inner(), body.approved)
    .await?;
  Ok(respond::ok(review))
}

#[instrument(name = "handler::delete_review", skip(app_state, path, _admin), fields(review_id = %path.as_ref()))]
pub async fn delete_review_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  app_state.repos.customers.delete_review(path.into_inner()).await?;
  Ok(respond::deleted())
}

// --- Customisation queries ---

#[instrument(name = "handler::submit_customisation_query", skip(app_state, body, user), fields(user_id = %user.user_id))]
pub async fn submit_query_handler(
  app_state: web::Data<AppState>,
  body: web::Json<CustomisationQueryInput>,
  user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  body.validate()?;
  let query = app_state.repos.content.create_query(Some(user.user_id), &body).await?;
  info!(query_id = %query.id, "Customisation query received.");
  Ok(respond::created(query))
}
