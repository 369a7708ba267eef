// storefront/tests/customer_tests.rs

#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use boutique_storefront::models::Role;
use common::*;
use serde_json::{json, Value};
use serial_test::serial;

#[actix_web::test]
#[serial]
async fn test_wishlist_add_is_idempotent() {
  setup_tracing();
  let app = TestApp::new();
  let service = test_service!(app);
  let (customer_id, customer) = app.user(Role::Customer);
  let product = app.product("kanjeevaram-saree", 18000, 1).await;

  let add = || {
    test::TestRequest::post()
      .uri("/api/wishlist")
      .insert_header(("Authorization", customer.clone()))
      .set_json(json!({ "product_id": product.id }))
      .to_request()
  };

  let resp = test::call_service(&service, add()).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["data"]["message"], "Added to wishlist");

  let resp = test::call_service(&service, add()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["data"]["added"], false);
  assert_eq!(body["data"]["message"], "Already in wishlist");
  assert_eq!(app.store.wishlist_len(customer_id), 1);

  let req = test::TestRequest::get()
    .uri("/api/wishlist")
    .insert_header(("Authorization", customer.clone()))
    .to_request();
  let body: Value = test::read_body_json(test::call_service(&service, req).await).await;
  assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

  let remove = || {
    test::TestRequest::delete()
      .uri(&format!("/api/wishlist/{}", product.id))
      .insert_header(("Authorization", customer.clone()))
      .to_request()
  };
  assert_eq!(test::call_service(&service, remove()).await.status(), StatusCode::OK);
  assert_eq!(test::call_service(&service, remove()).await.status(), StatusCode::NOT_FOUND);
  assert_eq!(app.store.wishlist_len(customer_id), 0);
}

#[actix_web::test]
#[serial]
async fn test_wishlist_rejects_unknown_products() {
  setup_tracing();
  let app = TestApp::new();
  let service = test_service!(app);
  let (_, customer) = app.user(Role::Customer);

  let req = test::TestRequest::post()
    .uri("/api/wishlist")
    .insert_header(("Authorization", customer))
    .set_json(json!({ "product_id": uuid::Uuid::new_v4() }))
    .to_request();
  assert_eq!(test::call_service(&service, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
#[serial]
async fn test_reviews_are_public_only_after_approval() {
  setup_tracing();
  let app = TestApp::new();
  let service = test_service!(app);
  let (_, admin) = app.user(Role::Admin);
  let (_, customer) = app.user(Role::Customer);
  let product = app.product("maheshwari-saree", 6400, 3).await;
  let reviews_uri = format!("/api/products/{}/reviews", product.id);

  let review = || {
    test::TestRequest::post()
      .uri(&reviews_uri)
      .insert_header(("Authorization", customer.clone()))
      .set_json(json!({ "rating": 5, "title": "Lovely drape" }))
      .to_request()
  };
  let resp = test::call_service(&service, review()).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["data"]["is_approved"], false);
  let review_id = body["data"]["id"].as_str().expect("review id").to_string();

  assert_eq!(test::call_service(&service, review()).await.status(), StatusCode::BAD_REQUEST);

  let public = || test::TestRequest::get().uri(&reviews_uri).to_request();
  let body: Value = test::read_body_json(test::call_service(&service, public()).await).await;
  assert_eq!(body["data"], json!([]));

  let req = test::TestRequest::patch()
    .uri(&format!("/api/admin/reviews/{}/approval", review_id))
    .insert_header(("Authorization", admin))
    .set_json(json!({ "approved": true }))
    .to_request();
  assert_eq!(test::call_service(&service, req).await.status(), StatusCode::OK);

  let body: Value = test::read_body_json(test::call_service(&service, public()).await).await;
  assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
  assert_eq!(body["data"][0]["rating"], 5);
}

#[actix_web::test]
#[serial]
async fn test_review_rating_must_be_in_range() {
  setup_tracing();
  let app = TestApp::new();
  let service = test_service!(app);
  let (_, customer) = app.user(Role::Customer);
  let product = app.product("jamdani-saree", 9900, 1).await;

  let req = test::TestRequest::post()
    .uri(&format!("/api/products/{}/reviews", product.id))
    .insert_header(("Authorization", customer))
    .set_json(json!({ "rating": 6 }))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["error"], "Rating must be between 1 and 5");
}

#[actix_web::test]
#[serial]
async fn test_profile_update_round_trip() {
  setup_tracing();
  let app = TestApp::new();
  let service = test_service!(app);
  let (_, customer) = app.user(Role::Customer);

  let req = test::TestRequest::put()
    .uri("/api/profile")
    .insert_header(("Authorization", customer.clone()))
    .set_json(json!({ "phone": "9000000001", "city": "Mysuru" }))
    .to_request();
  assert_eq!(test::call_service(&service, req).await.status(), StatusCode::OK);

  let req = test::TestRequest::get()
    .uri("/api/profile")
    .insert_header(("Authorization", customer))
    .to_request();
  let body: Value = test::read_body_json(test::call_service(&service, req).await).await;
  assert_eq!(body["data"]["full_name"], "Test User");
  assert_eq!(body["data"]["phone"], "9000000001");
  assert_eq!(body["data"]["city"], "Mysuru");
  assert_eq!(body["data"]["role"], "customer");
}

#[actix_web::test]
#[serial]
async fn test_public_catalog_hides_inactive_products() {
  setup_tracing();
  let app = TestApp::new();
  let service = test_service!(app);
  let (_, admin) = app.user(Role::Admin);
  app.product("visible-kurta", 1500, 4).await;

  let req = test::TestRequest::post()
    .uri("/api/admin/products")
    .insert_header(("Authorization", admin.clone()))
    .set_json(json!({
      "name": "Archived Saree",
      "slug": "archived-saree",
      "price_cents": 5000,
      "stock_quantity": 2,
      "is_active": false,
    }))
    .to_request();
  assert_eq!(test::call_service(&service, req).await.status(), StatusCode::CREATED);

  let req = test::TestRequest::get().uri("/api/products").to_request();
  let body: Value = test::read_body_json(test::call_service(&service, req).await).await;
  let slugs: Vec<&str> = body["data"]
    .as_array()
    .expect("product list")
    .iter()
    .filter_map(|p| p["slug"].as_str())
    .collect();
  assert_eq!(slugs, vec!["visible-kurta"]);

  let req = test::TestRequest::get().uri("/api/products/archived-saree").to_request();
  assert_eq!(test::call_service(&service, req).await.status(), StatusCode::NOT_FOUND);

  let req = test::TestRequest::get()
    .uri("/api/admin/products")
    .insert_header(("Authorization", admin))
    .to_request();
  let body: Value = test::read_body_json(test::call_service(&service, req).await).await;
  assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
}

#[actix_web::test]
#[serial]
async fn test_product_detail_by_slug_includes_sizes_and_discount() {
  setup_tracing();
  let app = TestApp::new();
  let service = test_service!(app);
  let (_, admin) = app.user(Role::Admin);

  let req = test::TestRequest::post()
    .uri("/api/admin/products")
    .insert_header(("Authorization", admin.clone()))
    .set_json(json!({
      "name": "Angrakha Kurta",
      "slug": "angrakha-kurta",
      "price_cents": 3000,
      "discount_price_cents": 2400,
      "stock_quantity": 6,
    }))
    .to_request();
  let body: Value = test::read_body_json(test::call_service(&service, req).await).await;
  let product_id = body["data"]["id"].as_str().expect("product id").to_string();

  let req = test::TestRequest::put()
    .uri(&format!("/api/admin/products/{}/sizes", product_id))
    .insert_header(("Authorization", admin))
    .set_json(json!({ "sizes": [{ "size": "M", "stock_quantity": 3 }, { "size": "L", "stock_quantity": 3 }] }))
    .to_request();
  assert_eq!(test::call_service(&service, req).await.status(), StatusCode::OK);

  let req = test::TestRequest::get().uri("/api/products/angrakha-kurta").to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["data"]["id"], product_id);
  assert_eq!(body["data"]["effective_price_cents"], 2400);
  assert_eq!(body["data"]["sizes"].as_array().map(Vec::len), Some(2));
}

#[actix_web::test]
#[serial]
async fn test_customisation_query_reaches_admin_inbox() {
  setup_tracing();
  let app = TestApp::new();
  let service = test_service!(app);
  let (_, admin) = app.user(Role::Admin);
  let (_, customer) = app.user(Role::Customer);

  let req = test::TestRequest::post()
    .uri("/api/customisation-queries")
    .insert_header(("Authorization", customer))
    .set_json(json!({
      "name": "Meera",
      "email": "meera@example.com",
      "message": "Can the blouse be stitched with elbow sleeves?",
    }))
    .to_request();
  assert_eq!(test::call_service(&service, req).await.status(), StatusCode::CREATED);

  let req = test::TestRequest::get()
    .uri("/api/admin/customisation-queries")
    .insert_header(("Authorization", admin))
    .to_request();
  let body: Value = test::read_body_json(test::call_service(&service, req).await).await;
  assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
  assert_eq!(body["data"][0]["status"], "new");
}
