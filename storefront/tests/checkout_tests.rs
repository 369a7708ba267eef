// storefront/tests/checkout_tests.rs

#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use boutique_storefront::db::{CatalogRepository, OrderRepository};
use boutique_storefront::models::Role;
use common::*;
use serde_json::{json, Value};
use serial_test::serial;

#[actix_web::test]
#[serial]
async fn test_checkout_order_is_priced_on_the_server() {
  setup_tracing();
  let app = TestApp::new();
  let service = test_service!(app);
  let (_, customer) = app.user(Role::Customer);
  let product = app.product("bandhani-saree", 2499, 5).await;

  let req = test::TestRequest::post()
    .uri("/api/checkout/order")
    .insert_header(("Authorization", customer))
    .set_json(json!({ "items": [{ "product_id": product.id, "quantity": 2 }] }))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["data"]["amount_cents"], 4998);
  assert_eq!(body["data"]["currency"], "INR");
  assert_eq!(body["data"]["key_id"], "key_test");
  assert_eq!(body["data"]["gateway_order_id"], "order_test_1");
}

#[actix_web::test]
#[serial]
async fn test_checkout_rejects_carts_beyond_stock() {
  setup_tracing();
  let app = TestApp::new();
  let service = test_service!(app);
  let (_, customer) = app.user(Role::Customer);
  let product = app.product("pashmina-shawl", 8000, 1).await;

  let req = test::TestRequest::post()
    .uri("/api/checkout/order")
    .insert_header(("Authorization", customer))
    .set_json(json!({ "items": [{ "product_id": product.id, "quantity": 2 }] }))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
#[serial]
async fn test_verify_with_bad_signature_places_nothing() {
  setup_tracing();
  let app = TestApp::new();
  let service = test_service!(app);
  let (customer_id, customer) = app.user(Role::Customer);
  let product = app.product("zari-lehenga", 12000, 2).await;
  app.gateway.insert_order("order_paid", 12000, "INR");

  let req = test::TestRequest::post()
    .uri("/api/checkout/verify")
    .insert_header(("Authorization", customer))
    .set_json(json!({
      "gateway_order_id": "order_paid",
      "payment_id": "pay_1",
      "signature": "deadbeef",
      "items": [{ "product_id": product.id, "quantity": 1 }],
      "shipping_address": address_json(),
    }))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["error"], "Payment verification failed");

  assert!(app.store.list_orders_for_user(customer_id).await.unwrap().is_empty());
  let stock = app.store.find_product(product.id).await.unwrap().unwrap().stock_quantity;
  assert_eq!(stock, 2);
}

#[actix_web::test]
#[serial]
async fn test_verify_with_valid_signature_confirms_the_order() {
  setup_tracing();
  let app = TestApp::new();
  let service = test_service!(app);
  let (_, admin) = app.user(Role::Admin);
  let (customer_id, customer) = app.user(Role::Customer);
  let product = app.product("phulkari-dupatta", 2499, 3).await;
  app.gateway.insert_order("order_paid", 2499, "INR");

  let req = test::TestRequest::post()
    .uri("/api/checkout/verify")
    .insert_header(("Authorization", customer))
    .set_json(json!({
      "gateway_order_id": "order_paid",
      "payment_id": "pay_1",
      "signature": FakeGateway::sign("order_paid", "pay_1"),
      "items": [{ "product_id": product.id, "quantity": 1 }],
      "shipping_address": address_json(),
    }))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["data"]["status"], "confirmed");
  assert_eq!(body["data"]["total_amount_cents"], 2499);
  assert_eq!(body["data"]["payment_id"], "pay_1");

  let orders = app.store.list_orders_for_user(customer_id).await.unwrap();
  assert_eq!(orders.len(), 1);
  let timeline = app.store.timeline(orders[0].id).await.unwrap();
  assert_eq!(timeline.len(), 1);
  assert_eq!(timeline[0].description, "Order placed and payment confirmed");
  let stock = app.store.find_product(product.id).await.unwrap().unwrap().stock_quantity;
  assert_eq!(stock, 2);

  let req = test::TestRequest::get()
    .uri("/api/admin/notifications")
    .insert_header(("Authorization", admin))
    .to_request();
  let body: Value = test::read_body_json(test::call_service(&service, req).await).await;
  let notifications = body["data"].as_array().expect("notification list");
  assert_eq!(notifications.len(), 1);
  assert_eq!(notifications[0]["title"], "New order received");
}

#[actix_web::test]
#[serial]
async fn test_verify_rejects_an_underpaid_gateway_order() {
  setup_tracing();
  let app = TestApp::new();
  let service = test_service!(app);
  let (customer_id, customer) = app.user(Role::Customer);
  let product = app.product("kalamkari-kurta", 2499, 3).await;
  app.gateway.insert_order("order_short", 100, "INR");

  let req = test::TestRequest::post()
    .uri("/api/checkout/verify")
    .insert_header(("Authorization", customer))
    .set_json(json!({
      "gateway_order_id": "order_short",
      "payment_id": "pay_2",
      "signature": FakeGateway::sign("order_short", "pay_2"),
      "items": [{ "product_id": product.id, "quantity": 1 }],
      "shipping_address": address_json(),
    }))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["error"], "Payment amount does not match the order total");
  assert!(app.store.list_orders_for_user(customer_id).await.unwrap().is_empty());
}

#[actix_web::test]
#[serial]
async fn test_verify_replay_is_refused() {
  setup_tracing();
  let app = TestApp::new();
  let service = test_service!(app);
  let (customer_id, customer) = app.user(Role::Customer);
  let product = app.product("ilkal-saree", 4500, 3).await;
  app.gateway.insert_order("order_once", 4500, "INR");

  let verify = || {
    test::TestRequest::post()
      .uri("/api/checkout/verify")
      .insert_header(("Authorization", customer.clone()))
      .set_json(json!({
        "gateway_order_id": "order_once",
        "payment_id": "pay_once",
        "signature": FakeGateway::sign("order_once", "pay_once"),
        "items": [{ "product_id": product.id, "quantity": 1 }],
        "shipping_address": address_json(),
      }))
      .to_request()
  };

  assert_eq!(test::call_service(&service, verify()).await.status(), StatusCode::CREATED);

  let resp = test::call_service(&service, verify()).await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["error"], "An order was already recorded for this payment");

  assert_eq!(app.store.list_orders_for_user(customer_id).await.unwrap().len(), 1);
  let stock = app.store.find_product(product.id).await.unwrap().unwrap().stock_quantity;
  assert_eq!(stock, 2);
}
