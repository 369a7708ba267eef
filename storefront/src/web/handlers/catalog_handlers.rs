// storefront/src/web/handlers/catalog_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{CategoryInput, Product, ProductDetail, ProductFilter, ProductInput, SizeInput};
use crate::state::AppState;
use crate::web::extractors::AdminUser;
use crate::web::respond;

async fn product_detail(app_state: &AppState, product: Product) -> Result<ProductDetail, AppError> {
  let images = app_state.repos.catalog.product_images(product.id).await?;
  let sizes = app_state.repos.catalog.product_sizes(product.id).await?;
  Ok(ProductDetail {
    effective_price_cents: product.effective_price_cents(),
    product,
    images,
    sizes,
  })
}

#[instrument(name = "handler::list_products", skip(app_state, query))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ProductFilter>,
) -> Result<HttpResponse, AppError> {
  let mut filter = query.into_inner();
  filter.include_inactive = false;
  let products = app_state.repos.catalog.list_products(&filter).await?;
  info!("Fetched {} active products.", products.len());
  Ok(respond::ok(products))
}

/// Looks a product up by id, or by slug when the segment is not a UUID.
#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_ref = %path.as_ref()))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let product_ref = path.into_inner();
  let product = match Uuid::parse_str(&product_ref) {
    Ok(product_id) => app_state.repos.catalog.find_product(product_id).await?,
    Err(_) => app_state.repos.catalog.find_product_by_slug(&product_ref).await?,
  };
  match product.filter(|p| p.is_active) {
    Some(product) => Ok(respond::ok(product_detail(&app_state, product).await?)),
    None => {
      warn!("Product {} not found.", product_ref);
      Err(AppError::NotFound(format!("Product {} not found", product_ref)))
    }
  }
}

#[instrument(name = "handler::list_categories", skip(app_state))]
pub async fn list_categories_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  Ok(respond::ok(app_state.repos.catalog.list_categories(false).await?))
}

// --- Admin ---

#[instrument(name = "handler::admin_list_products", skip(app_state, query, admin), fields(admin_id = %admin.user_id))]
pub async fn admin_list_products_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ProductFilter>,
  admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let mut filter = query.into_inner();
  filter.include_inactive = true;
  Ok(respond::ok(app_state.repos.catalog.list_products(&filter).await?))
}

#[instrument(name = "handler::admin_get_product", skip(app_state, path, _admin), fields(product_id = %path.as_ref()))]
pub async fn admin_get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  let product = app_state
    .repos
    .catalog
    .find_product(product_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Product {} not found", product_id)))?;
  Ok(respond::ok(product_detail(&app_state, product).await?))
}

#[instrument(name = "handler::create_product", skip(app_state, body, _admin), fields(slug = %body.slug))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  body: web::Json<ProductInput>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  body.validate()?;
  let product = app_state.repos.catalog.create_product(&body).await?;
  info!(product_id = %product.id, "Product created.");
  Ok(respond::created(product))
}

#[instrument(name = "handler::update_product", skip(app_state, path, body, _admin), fields(product_id = %path.as_ref()))]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  body: web::Json<ProductInput>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  body.validate()?;
  let product = app_state.repos.catalog.update_product(path.into_inner(), &body).await?;
  Ok(respond::ok(product))
}

#[instrument(name = "handler::delete_product", skip(app_state, path, _admin), fields(product_id = %path.as_ref()))]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  app_state.repos.catalog.delete_product(path.into_inner()).await?;
  info!("Product deleted.");
  Ok(respond::deleted())
}

#[derive(Debug, Deserialize)]
pub struct ImagesPayload {
  pub urls: Vec<String>,
}

#[instrument(name = "handler::replace_product_images", skip(app_state, path, body, _admin), fields(product_id = %path.as_ref()))]
pub async fn replace_images_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  body: web::Json<ImagesPayload>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  if body.urls.iter().any(|u| u.trim().is_empty()) {
    return Err(AppError::Validation("Image URLs cannot be empty".to_string()));
  }
  let images = app_state.repos.catalog.replace_images(path.into_inner(), &body.urls).await?;
  Ok(respond::ok(images))
}

#[derive(Debug, Deserialize)]
pub struct SizesPayload {
  pub sizes: Vec<SizeInput>,
}

#[instrument(name = "handler::replace_product_sizes", skip(app_state, path, body, _admin), fields(product_id = %path.as_ref()))]
pub async fn replace_sizes_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  body: web::Json<SizesPayload>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  if body.sizes.iter().any(|s| s.size.trim().is_empty() || s.stock_quantity < 0) {
    return Err(AppError::Validation("Each size needs a label and non-negative stock".to_string()));
  }
  let sizes = app_state.repos.catalog.replace_sizes(path.into_inner(), &body.sizes).await?;
  Ok(respond::ok(sizes))
}

#[instrument(name = "handler::admin_list_categories", skip(app_state, _admin))]
pub async fn admin_list_categories_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  Ok(respond::ok(app_state.repos.catalog.list_categories(true).await?))
}

#[instrument(name = "handler::create_category", skip(app_state, body, _admin), fields(slug = %body.slug))]
pub async fn create_category_handler(
  app_state: web::Data<AppState>,
  body: web::Json<CategoryInput>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  body.validate()?;
  Ok(respond::created(app_state.repos.catalog.create_category(&body).await?))
}

#[instrument(name = "handler::update_category", skip(app_state, path, body, _admin), fields(category_id = %path.as_ref()))]
pub async fn update_category_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  body: web::Json<CategoryInput>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  body.validate()?;
  Ok(respond::ok(
    app_state.repos.catalog.update_category(path.into_inner(), &body).await?,
  ))
}

#[instrument(name = "handler::delete_category", skip(app_state, path, _admin), fields(category_id = %path.as_ref()))]
pub async fn delete_category_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  app_state.repos.catalog.delete_category(path.into_inner()).await?;
  Ok(respond::deleted())
}
