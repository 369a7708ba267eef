// storefront/src/web/routes.rs

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::errors::AppError;
use crate::web::handlers::{
  catalog_handlers as catalog, checkout_handlers as checkout, content_handlers as content,
  customer_handlers as customer, order_handlers as orders, shipping_handlers as shipping,
};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(json!({ "status": "ok" }))
}

fn admin_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .route("/dashboard", web::get().to(content::dashboard_handler))
    // Orders and shipping
    .route("/orders", web::get().to(orders::admin_list_orders_handler))
    .route("/orders/{order_id}", web::get().to(orders::admin_get_order_handler))
    .route("/orders/{order_id}/status", web::patch().to(orders::update_order_status_handler))
    .route("/orders/{order_id}/shipment", web::post().to(orders::create_shipment_handler))
    .route("/orders/{order_id}/invoice", web::post().to(orders::generate_invoice_handler))
    .route("/orders/{order_id}/tracking/sync", web::post().to(orders::sync_tracking_handler))
    // Catalog
    .route("/products", web::get().to(catalog::admin_list_products_handler))
    .route("/products", web::post().to(catalog::create_product_handler))
    .route("/products/{product_id}", web::get().to(catalog::admin_get_product_handler))
    .route("/products/{product_id}", web::put().to(catalog::update_product_handler))
    .route("/products/{product_id}", web::delete().to(catalog::delete_product_handler))
    .route("/products/{product_id}/images", web::put().to(catalog::replace_images_handler))
    .route("/products/{product_id}/sizes", web::put().to(catalog::replace_sizes_handler))
    .route("/categories", web::get().to(catalog::admin_list_categories_handler))
    .route("/categories", web::post().to(catalog::create_category_handler))
    .route("/categories/{category_id}", web::put().to(catalog::update_category_handler))
    .route("/categories/{category_id}", web::delete().to(catalog::delete_category_handler))
    // Content
    .route("/banners", web::get().to(content::admin_list_banners_handler))
    .route("/banners", web::post().to(content::create_banner_handler))
    .route("/banners/{banner_id}", web::put().to(content::update_banner_handler))
    .route("/banners/{banner_id}", web::delete().to(content::delete_banner_handler))
    .route("/reviews", web::get().to(customer::admin_list_reviews_handler))
    .route("/reviews/{review_id}/approval", web::patch().to(customer::set_review_approval_handler))
    .route("/reviews/{review_id}", web::delete().to(customer::delete_review_handler))
    .route("/customisation-queries", web::get().to(content::list_queries_handler))
    .route("/customisation-queries/{query_id}", web::patch().to(content::update_query_status_handler))
    .route("/customisation-queries/{query_id}", web::delete().to(content::delete_query_handler))
    .route("/notifications", web::get().to(content::list_notifications_handler))
    .route("/notifications/read-all", web::post().to(content::mark_all_notifications_read_handler))
    .route("/notifications/{notification_id}/read", web::post().to(content::mark_notification_read_handler));
}

/// Mounts the `/api` surface. Malformed bodies, queries and paths answer with
/// the same `{"error": ...}` shape as every other failure.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(web::JsonConfig::default().error_handler(|err, _req| AppError::Validation(err.to_string()).into()))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| AppError::Validation(err.to_string()).into()))
    .app_data(web::PathConfig::default().error_handler(|err, _req| AppError::Validation(err.to_string()).into()));

  cfg.service(
    web::scope("/api")
      .route("/health", web::get().to(health_check_handler))
      // Public
      .route("/products", web::get().to(catalog::list_products_handler))
      .route("/products/{product_ref}", web::get().to(catalog::get_product_handler))
      .route("/products/{product_id}/reviews", web::get().to(customer::product_reviews_handler))
      .route("/categories", web::get().to(catalog::list_categories_handler))
      .route("/banners", web::get().to(content::list_banners_handler))
      .route("/webhooks/carrier", web::post().to(shipping::carrier_webhook_handler))
      // Signed-in customers
      .route("/profile", web::get().to(customer::get_profile_handler))
      .route("/profile", web::put().to(customer::update_profile_handler))
      .route("/orders", web::get().to(orders::list_my_orders_handler))
      .route("/orders/{order_id}", web::get().to(orders::get_my_order_handler))
      .route("/orders/{order_id}/tracking", web::get().to(orders::track_my_order_handler))
      .route("/checkout/order", web::post().to(checkout::create_checkout_order_handler))
      .route("/checkout/verify", web::post().to(checkout::verify_checkout_handler))
      .route("/wishlist", web::get().to(customer::list_wishlist_handler))
      .route("/wishlist", web::post().to(customer::add_to_wishlist_handler))
      .route("/wishlist/{product_id}", web::delete().to(customer::remove_from_wishlist_handler))
      .route("/products/{product_id}/reviews", web::post().to(customer::create_review_handler))
      .route("/customisation-queries", web::post().to(customer::submit_query_handler))
      .route("/shipping/serviceability", web::get().to(shipping::serviceability_handler))
      // Admins
      .service(web::scope("/admin").configure(admin_routes)),
  );
}
