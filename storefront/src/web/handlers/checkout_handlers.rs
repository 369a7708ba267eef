// storefront/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use stepflow::{ContextData, PipelineResult};
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::models::ShippingAddress;
use crate::pipelines::contexts::{CheckoutCtxData, PaymentConfirmation};
use crate::services::pricing::{price_cart, CartItemInput};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;
use crate::web::respond;

#[derive(Debug, Deserialize)]
pub struct CreateCheckoutPayload {
  pub items: Vec<CartItemInput>,
}

/// Prices the cart and opens a gateway order the client then pays.
#[instrument(
  name = "handler::create_checkout_order",
  skip(app_state, body, user),
  fields(user_id = %user.user_id, lines = body.items.len())
)]
pub async fn create_checkout_order_handler(
  app_state: web::Data<AppState>,
  body: web::Json<CreateCheckoutPayload>,
  user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let priced = price_cart(app_state.repos.catalog.as_ref(), &body.items).await?;
  let currency = app_state.config.payment.currency.clone();
  let receipt = format!("rcpt_{}", uuid::Uuid::new_v4().simple());

  let gateway_order = app_state
    .payments
    .create_order(priced.total_cents, &currency, &receipt)
    .await?;
  info!(
    gateway_order_id = %gateway_order.id,
    amount_cents = priced.total_cents,
    "Gateway order opened for checkout."
  );

  Ok(respond::created(json!({
    "gateway_order_id": gateway_order.id,
    "amount_cents": priced.total_cents,
    "currency": currency,
    "key_id": app_state.payments.key_id(),
  })))
}

#[derive(Debug, Deserialize)]
pub struct VerifyCheckoutPayload {
  pub gateway_order_id: String,
  pub payment_id: String,
  pub signature: String,
  pub items: Vec<CartItemInput>,
  pub shipping_address: ShippingAddress,
}

/// Confirms a paid gateway order and places the storefront order.
#[instrument(
  name = "handler::verify_checkout",
  skip(app_state, body, user),
  fields(user_id = %user.user_id, gateway_order_id = %body.gateway_order_id)
)]
pub async fn verify_checkout_handler(
  app_state: web::Data<AppState>,
  body: web::Json<VerifyCheckoutPayload>,
  user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let payload = body.into_inner();
  let ctx = ContextData::new(CheckoutCtxData {
    catalog: app_state.repos.catalog.clone(),
    orders: app_state.repos.orders.clone(),
    content: app_state.repos.content.clone(),
    payments: app_state.payments.clone(),
    user_id: user.user_id,
    currency: app_state.config.payment.currency.clone(),
    payment: PaymentConfirmation {
      gateway_order_id: payload.gateway_order_id,
      payment_id: payload.payment_id,
      signature: payload.signature,
    },
    items: payload.items,
    shipping_address: payload.shipping_address,
    priced: None,
    order: None,
    admin_notified: false,
  });

  match app_state.flows.run(ctx.clone()).await? {
    PipelineResult::Completed => {
      let order = ctx.with(|d| d.order.clone()).ok_or_else(|| {
        AppError::Internal("Checkout completed but no order was recorded".to_string())
      })?;
      info!(order_id = %order.id, "Checkout completed.");
      Ok(respond::created(order))
    }
    PipelineResult::Stopped => {
      warn!("Checkout pipeline stopped before placing the order.");
      Err(AppError::Internal("Checkout was halted before the order was placed".to_string()))
    }
  }
}
