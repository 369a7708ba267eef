// storefront/tests/access_tests.rs

#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::http::Method;
use actix_web::test;
use boutique_storefront::db::{CatalogRepository, ContentRepository, CustomerRepository, OrderRepository};
use boutique_storefront::models::{NewNotification, NewReview, NotificationFilter, ProductFilter, Role};
use common::*;
use serde_json::{json, Value};
use serial_test::serial;
use uuid::Uuid;

#[actix_web::test]
#[serial]
async fn test_admin_routes_require_a_token() {
  setup_tracing();
  let app = TestApp::new();
  let service = test_service!(app);

  let req = test::TestRequest::get().uri("/api/admin/dashboard").to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["error"], "Missing Authorization header");

  let req = test::TestRequest::get()
    .uri("/api/admin/orders")
    .insert_header(("Authorization", "Bearer not-a-jwt"))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
#[serial]
async fn test_customers_and_profileless_callers_are_forbidden_on_admin_routes() {
  setup_tracing();
  let app = TestApp::new();
  let service = test_service!(app);
  let (_, customer) = app.user(Role::Customer);

  let req = test::TestRequest::get()
    .uri("/api/admin/dashboard")
    .insert_header(("Authorization", customer))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);

  let req = test::TestRequest::get()
    .uri("/api/admin/orders")
    .insert_header(("Authorization", bearer(Uuid::new_v4())))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
#[serial]
async fn test_admin_sees_dashboard() {
  setup_tracing();
  let app = TestApp::new();
  let service = test_service!(app);
  let (_, admin) = app.user(Role::Admin);
  let (customer_id, _) = app.user(Role::Customer);
  let product = app.product("mulmul-kurta", 1999, 3).await;
  app.order(customer_id, &product, 1).await;

  let req = test::TestRequest::get()
    .uri("/api/admin/dashboard")
    .insert_header(("Authorization", admin))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["data"]["total_orders"], 1);
}

#[actix_web::test]
#[serial]
async fn test_customer_without_profile_can_use_customer_routes() {
  setup_tracing();
  let app = TestApp::new();
  let service = test_service!(app);

  let req = test::TestRequest::get()
    .uri("/api/orders")
    .insert_header(("Authorization", bearer(Uuid::new_v4())))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["data"], serde_json::json!([]));
}

#[actix_web::test]
#[serial]
async fn test_other_users_orders_are_not_found() {
  setup_tracing();
  let app = TestApp::new();
  let service = test_service!(app);
  let (owner_id, owner) = app.user(Role::Customer);
  let (_, stranger) = app.user(Role::Customer);
  let product = app.product("ajrakh-stole", 1500, 5).await;
  let order = app.order(owner_id, &product, 1).await;

  let uri = format!("/api/orders/{}", order.id);
  let req = test::TestRequest::get()
    .uri(&uri)
    .insert_header(("Authorization", stranger))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let req = test::TestRequest::get()
    .uri(&uri)
    .insert_header(("Authorization", owner))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["data"]["id"], order.id.to_string());
  assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
#[serial]
async fn test_admin_writes_are_refused_without_admin_role() {
  setup_tracing();
  let app = TestApp::new();
  let service = test_service!(app);
  let (customer_id, customer) = app.user(Role::Customer);
  let product = app.product("kantha-stole", 2100, 4).await;
  let order = app.order(customer_id, &product, 1).await;
  let review = app
    .store
    .create_review(NewReview {
      product_id: product.id,
      user_id: customer_id,
      rating: 4,
      title: None,
      comment: None,
    })
    .await
    .unwrap();
  app
    .store
    .create_notification(NewNotification {
      kind: "order".to_string(),
      title: "New order received".to_string(),
      message: "An order is waiting".to_string(),
      order_id: Some(order.id),
    })
    .await
    .unwrap();

  let routes = [
    (
      Method::PATCH,
      format!("/api/admin/orders/{}/status", order.id),
      Some(json!({ "status": "shipped" })),
    ),
    (Method::POST, format!("/api/admin/orders/{}/shipment", order.id), None),
    (
      Method::POST,
      "/api/admin/products".to_string(),
      Some(json!({ "name": "Sneaky Saree", "slug": "sneaky-saree", "price_cents": 100, "stock_quantity": 1 })),
    ),
    (Method::DELETE, format!("/api/admin/reviews/{}", review.id), None),
    (Method::POST, "/api/admin/notifications/read-all".to_string(), None),
  ];

  for (method, uri, body) in &routes {
    for (auth, expected) in [(None, StatusCode::UNAUTHORIZED), (Some(customer.clone()), StatusCode::FORBIDDEN)] {
      let mut req = test::TestRequest::default().method(method.clone()).uri(uri);
      if let Some(header) = auth {
        req = req.insert_header(("Authorization", header));
      }
      if let Some(body) = body {
        req = req.set_json(body);
      }
      let resp = test::call_service(&service, req.to_request()).await;
      assert_eq!(resp.status(), expected, "{} {}", method, uri);
      let body: Value = test::read_body_json(resp).await;
      assert!(body.get("data").is_none(), "{} {} leaked data", method, uri);
    }
  }

  let stored = app.store.find_order(order.id).await.unwrap().unwrap();
  assert_eq!(stored.status, order.status);
  assert_eq!(app.store.timeline(order.id).await.unwrap().len(), 1);
  assert!(app.journal.completed_steps(&order.id.to_string()).is_empty());
  assert_eq!(app.carrier.calls_to("create_order"), 0);
  let products = app
    .store
    .list_products(&ProductFilter {
      include_inactive: true,
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(products.len(), 1);
  assert_eq!(app.store.list_all_reviews().await.unwrap().len(), 1);
  let unread = app
    .store
    .list_notifications(&NotificationFilter { unread_only: true })
    .await
    .unwrap();
  assert_eq!(unread.len(), 1);
}
