// storefront/src/pipelines/contexts.rs

//! Data the storefront's pipelines operate on. Handlers receive these wrapped
//! in `stepflow::ContextData`.

use crate::db::{CatalogRepository, ContentRepository, OrderRepository};
use crate::models::{Order, OrderItem, ShippingAddress};
use crate::services::carrier::{CarrierApi, PackageDimensions};
use crate::services::payment_gateway::PaymentGateway;
use crate::services::pricing::{CartItemInput, PricedCart};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// What the checkout widget hands back after the customer pays.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfirmation {
  pub gateway_order_id: String,
  pub payment_id: String,
  pub signature: String,
}

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub catalog: Arc<dyn CatalogRepository>,
  pub orders: Arc<dyn OrderRepository>,
  pub content: Arc<dyn ContentRepository>,
  pub payments: Arc<dyn PaymentGateway>,
  pub user_id: Uuid,
  pub currency: String,
  pub payment: PaymentConfirmation,
  pub items: Vec<CartItemInput>,
  pub shipping_address: ShippingAddress,

  pub priced: Option<PricedCart>,
  pub order: Option<Order>,
  pub admin_notified: bool,
}

/// One shipment run. `order` is refreshed from the store after every step, so
/// a resumed run sees the outputs of the steps that already completed.
#[derive(Clone)]
pub struct ShipmentCtxData {
  pub orders: Arc<dyn OrderRepository>,
  pub carrier: Arc<dyn CarrierApi>,
  pub run_key: String,
  pub order: Order,
  pub items: Vec<OrderItem>,
  pub customer_email: Option<String>,
  pub package: PackageDimensions,
  pub pickup_location: String,
}
