// storefront/src/web/respond.rs

//! Success envelopes. Errors use `{"error": ...}` via `AppError`.

use actix_web::HttpResponse;
use serde::Serialize;
use serde_json::json;

pub fn ok<T: Serialize>(data: T) -> HttpResponse {
  HttpResponse::Ok().json(json!({ "data": data }))
}

pub fn created<T: Serialize>(data: T) -> HttpResponse {
  HttpResponse::Created().json(json!({ "data": data }))
}

pub fn deleted() -> HttpResponse {
  HttpResponse::Ok().json(json!({ "data": { "deleted": true } }))
}
