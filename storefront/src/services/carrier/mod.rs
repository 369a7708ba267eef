// storefront/src/services/carrier/mod.rs

//! Shipping carrier (logistics aggregator) port.
//!
//! [`CarrierApi`] speaks in storefront types; the HTTP client in [`http`]
//! owns the carrier's wire format.

pub mod http;

use crate::errors::Result;
use crate::models::{OrderStatus, ShippingAddress};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use http::HttpCarrierClient;

#[derive(Debug, Clone, Serialize)]
pub struct ServiceabilityQuery {
  pub pickup_postcode: String,
  pub delivery_postcode: String,
  pub weight_kg: f64,
  pub cod: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CourierOption {
  pub courier_company_id: i64,
  pub courier_name: String,
  pub rate_cents: i64,
  pub cod_charges_cents: i64,
  pub estimated_delivery_days: Option<String>,
  pub etd: Option<String>,
}

/// Parcel size used for carrier orders. Defaults fit a folded garment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageDimensions {
  pub weight_kg: f64,
  pub length_cm: f64,
  pub breadth_cm: f64,
  pub height_cm: f64,
}

impl Default for PackageDimensions {
  fn default() -> Self {
    Self {
      weight_kg: 0.5,
      length_cm: 30.0,
      breadth_cm: 25.0,
      height_cm: 5.0,
    }
  }
}

#[derive(Debug, Clone)]
pub struct CarrierOrderLine {
  pub name: String,
  pub sku: String,
  pub units: i32,
  pub selling_price_cents: i64,
}

#[derive(Debug, Clone)]
pub struct CarrierOrderRequest {
  /// The storefront order id, echoed back by the carrier.
  pub order_id: String,
  pub order_date: DateTime<Utc>,
  pub pickup_location: String,
  pub address: ShippingAddress,
  pub email: Option<String>,
  pub lines: Vec<CarrierOrderLine>,
  pub sub_total_cents: i64,
  pub package: PackageDimensions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierOrder {
  pub carrier_order_id: String,
  pub shipment_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwbAssignment {
  pub awb_code: String,
  pub courier_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickupScheduled {
  pub pickup_token: Option<String>,
  pub scheduled_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelGenerated {
  pub label_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvoiceGenerated {
  pub created: bool,
  pub invoice_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingActivity {
  pub date: String,
  /// The carrier's own status label.
  pub status: String,
  pub location: Option<String>,
  pub description: Option<String>,
}

/// What the carrier reports for one AWB. Empty when nothing is scanned yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackingSnapshot {
  pub current_status: Option<String>,
  pub activities: Vec<TrackingActivity>,
  pub tracking_url: Option<String>,
  pub etd: Option<String>,
}

#[async_trait]
pub trait CarrierApi: Send + Sync {
  async fn serviceability(&self, query: &ServiceabilityQuery) -> Result<Vec<CourierOption>>;

  async fn create_order(&self, request: &CarrierOrderRequest, idempotency_key: &str) -> Result<CarrierOrder>;

  async fn assign_awb(&self, shipment_id: &str, idempotency_key: &str) -> Result<AwbAssignment>;

  async fn request_pickup(&self, shipment_id: &str, idempotency_key: &str) -> Result<PickupScheduled>;

  async fn generate_label(&self, shipment_id: &str, idempotency_key: &str) -> Result<LabelGenerated>;

  async fn generate_invoice(&self, carrier_order_ids: &[String]) -> Result<InvoiceGenerated>;

  async fn track_awb(&self, awb_code: &str) -> Result<TrackingSnapshot>;
}

/// Carrier status labels collapsed to what the storefront shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimplifiedStatus {
  Shipped,
  InTransit,
  Delivered,
  Cancelled,
  Unknown,
}

const SHIPPED_LABELS: &[&str] = &[
  "SHIPPED",
  "AWB ASSIGNED",
  "LABEL GENERATED",
  "PICKUP SCHEDULED",
  "PICKUP GENERATED",
  "PICKUP QUEUED",
  "MANIFEST GENERATED",
  "READY TO SHIP",
  "OUT FOR PICKUP",
];

const IN_TRANSIT_LABELS: &[&str] = &[
  "PICKED UP",
  "IN TRANSIT",
  "OUT FOR DELIVERY",
  "REACHED AT DESTINATION HUB",
  "REACHED DESTINATION HUB",
  "SHIPMENT DELAYED",
  "UNDELIVERED",
];

impl SimplifiedStatus {
  pub fn from_carrier_label(label: &str) -> Self {
    let normalized = label.trim().to_ascii_uppercase().replace(['_', '-'], " ");
    if normalized.is_empty() {
      return SimplifiedStatus::Unknown;
    }
    if normalized.contains("CANCEL") || normalized.starts_with("RTO") {
      return SimplifiedStatus::Cancelled;
    }
    if normalized == "DELIVERED" {
      return SimplifiedStatus::Delivered;
    }
    if IN_TRANSIT_LABELS.contains(&normalized.as_str()) || normalized.contains("TRANSIT") {
      return SimplifiedStatus::InTransit;
    }
    if SHIPPED_LABELS.contains(&normalized.as_str()) {
      return SimplifiedStatus::Shipped;
    }
    SimplifiedStatus::Unknown
  }

  pub fn as_order_status(&self) -> Option<OrderStatus> {
    match self {
      SimplifiedStatus::Shipped => Some(OrderStatus::Shipped),
      SimplifiedStatus::InTransit => Some(OrderStatus::InTransit),
      SimplifiedStatus::Delivered => Some(OrderStatus::Delivered),
      SimplifiedStatus::Cancelled => Some(OrderStatus::Cancelled),
      SimplifiedStatus::Unknown => None,
    }
  }
}
