// storefront/src/web/handlers/shipping_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::services::carrier::ServiceabilityQuery;
use crate::services::signature;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;
use crate::web::respond;

pub const CARRIER_SIGNATURE_HEADER: &str = "x-carrier-signature";

fn default_weight() -> f64 {
  0.5
}

#[derive(Debug, Deserialize)]
pub struct ServiceabilityParams {
  pub delivery_postcode: String,
  #[serde(default)]
  pub pickup_postcode: Option<String>,
  #[serde(default = "default_weight")]
  pub weight_kg: f64,
  #[serde(default)]
  pub cod: bool,
}

#[instrument(
  name = "handler::check_serviceability",
  skip(app_state, query, user),
  fields(user_id = %user.user_id, delivery_postcode = %query.delivery_postcode)
)]
pub async fn serviceability_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ServiceabilityParams>,
  user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let params = query.into_inner();
  let pickup_postcode = params
    .pickup_postcode
    .filter(|p| !p.trim().is_empty())
    .unwrap_or_else(|| app_state.shipping.pickup_postcode().to_string());
  let quote = app_state
    .shipping
    .check_serviceability(&ServiceabilityQuery {
      pickup_postcode,
      delivery_postcode: params.delivery_postcode,
      weight_kg: params.weight_kg,
      cod: params.cod,
    })
    .await?;
  Ok(respond::ok(quote))
}

#[derive(Debug, Deserialize)]
pub struct CarrierEvent {
  pub awb: String,
  pub current_status: String,
  #[serde(default)]
  pub location: Option<String>,
}

/// Status pushes from the carrier, signed with the shared webhook secret.
#[instrument(name = "handler::carrier_webhook", skip(app_state, req, body), fields(payload_bytes = body.len()))]
pub async fn carrier_webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let provided = req
    .headers()
    .get(CARRIER_SIGNATURE_HEADER)
    .and_then(|value| value.to_str().ok())
    .ok_or_else(|| {
      warn!("Carrier webhook without a signature header.");
      AppError::Unauthorized("Missing webhook signature".to_string())
    })?;
  if !signature::verify_hex(&app_state.config.carrier.webhook_secret, &body, provided.trim()) {
    warn!("Carrier webhook signature mismatch.");
    return Err(AppError::Unauthorized("Invalid webhook signature".to_string()));
  }

  let event: CarrierEvent = serde_json::from_slice(&body)
    .map_err(|e| AppError::Validation(format!("Malformed carrier event: {}", e)))?;
  info!(awb = %event.awb, carrier_status = %event.current_status, "Carrier event received.");

  let updated = app_state
    .shipping
    .apply_carrier_event(&event.awb, &event.current_status, event.location)
    .await?;

  Ok(respond::ok(json!({
    "received": true,
    "applied": updated.is_some(),
    "order_status": updated.map(|order| order.status),
  })))
}
