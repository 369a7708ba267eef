// storefront/src/state.rs

use crate::config::AppConfig;
use crate::db::Repositories;
use crate::errors::{AppError, Result};
use crate::pipelines;
use crate::services::access::TokenVerifier;
use crate::services::carrier::{CarrierApi, HttpCarrierClient};
use crate::services::order_status::OrderStatusManager;
use crate::services::payment_gateway::{HttpPaymentGateway, PaymentGateway};
use crate::services::shipping::ShippingAdapter;
use std::sync::Arc;
use std::time::Duration;
use stepflow::Flows;

/// Shared, immutable application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
  pub config: Arc<AppConfig>,
  pub repos: Repositories,
  pub payments: Arc<dyn PaymentGateway>,
  pub flows: Arc<Flows<AppError>>,
  pub status: OrderStatusManager,
  pub shipping: ShippingAdapter,
  pub tokens: Arc<TokenVerifier>,
}

impl AppState {
  /// Wires services over the given storage and external clients and registers
  /// the pipelines.
  pub fn new(
    config: Arc<AppConfig>,
    repos: Repositories,
    payments: Arc<dyn PaymentGateway>,
    carrier: Arc<dyn CarrierApi>,
  ) -> Self {
    let flows = Arc::new(Flows::<AppError>::new());
    pipelines::register_all_pipelines(&flows);

    let status = OrderStatusManager::new(repos.orders.clone(), config.order_status_policy);
    let shipping = ShippingAdapter::new(
      carrier,
      repos.clone(),
      flows.clone(),
      status.clone(),
      config.carrier.pickup_postcode.clone(),
      config.carrier.pickup_location.clone(),
    );
    let tokens = Arc::new(TokenVerifier::new(&config.auth));

    Self {
      config,
      repos,
      payments,
      flows,
      status,
      shipping,
      tokens,
    }
  }

  /// As [`AppState::new`], with the HTTP clients for the configured payment
  /// gateway and carrier.
  pub fn with_http_clients(config: Arc<AppConfig>, repos: Repositories) -> Result<Self> {
    let timeout = Duration::from_secs(config.carrier.timeout_secs);
    let payments = Arc::new(HttpPaymentGateway::new(&config.payment, timeout)?);
    let carrier = Arc::new(HttpCarrierClient::new(&config.carrier)?);
    Ok(Self::new(config, repos, payments, carrier))
  }
}
