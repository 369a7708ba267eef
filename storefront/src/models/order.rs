// storefront/src/models/order.rs

use crate::errors::AppError;
use crate::models::order_item::OrderItem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "order_status_enum", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
  Pending,
  Confirmed,
  Processing,
  Shipped,
  InTransit,
  Delivered,
  Cancelled,
  Refunded,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 8] = [
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Processing,
    OrderStatus::Shipped,
    OrderStatus::InTransit,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
    OrderStatus::Refunded,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Confirmed => "confirmed",
      OrderStatus::Processing => "processing",
      OrderStatus::Shipped => "shipped",
      OrderStatus::InTransit => "in_transit",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Cancelled => "cancelled",
      OrderStatus::Refunded => "refunded",
    }
  }

  /// Statuses the dashboard counts as awaiting fulfilment.
  pub fn is_open(&self) -> bool {
    matches!(self, OrderStatus::Pending | OrderStatus::Confirmed | OrderStatus::Processing)
  }

  /// Whether the order's amount counts towards revenue.
  pub fn counts_as_revenue(&self) -> bool {
    !matches!(self, OrderStatus::Cancelled | OrderStatus::Refunded)
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    OrderStatus::ALL
      .iter()
      .copied()
      .find(|status| status.as_str() == s)
      .ok_or_else(|| AppError::Validation(format!("Unknown order status '{}'", s)))
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ShippingAddress {
  #[sqlx(rename = "shipping_name")]
  pub full_name: String,
  #[sqlx(rename = "shipping_phone")]
  pub phone: String,
  #[sqlx(rename = "shipping_line1")]
  pub line1: String,
  #[sqlx(rename = "shipping_line2")]
  #[serde(default)]
  pub line2: Option<String>,
  #[sqlx(rename = "shipping_city")]
  pub city: String,
  #[sqlx(rename = "shipping_state")]
  pub state: String,
  #[sqlx(rename = "shipping_postcode")]
  pub postcode: String,
  #[sqlx(rename = "shipping_country")]
  pub country: String,
}

impl ShippingAddress {
  pub fn validate(&self) -> Result<(), AppError> {
    let required = [
      ("full_name", &self.full_name),
      ("phone", &self.phone),
      ("line1", &self.line1),
      ("city", &self.city),
      ("state", &self.state),
      ("postcode", &self.postcode),
      ("country", &self.country),
    ];
    for (field, value) in required {
      if value.trim().is_empty() {
        return Err(AppError::Validation(format!("Shipping address {} is required", field)));
      }
    }
    Ok(())
  }
}

/// Carrier-side identifiers collected while the shipment is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, FromRow)]
pub struct ShipmentDetails {
  pub carrier_order_id: Option<String>,
  pub shipment_id: Option<String>,
  pub awb_code: Option<String>,
  pub courier_name: Option<String>,
  pub tracking_url: Option<String>,
  pub pickup_token: Option<String>,
  pub label_url: Option<String>,
  pub invoice_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
  pub id: Uuid,
  pub user_id: Uuid,
  pub status: OrderStatus,
  pub total_amount_cents: i64,
  pub currency: String,
  #[sqlx(flatten)]
  pub shipping_address: ShippingAddress,
  pub payment_gateway_order_id: Option<String>,
  pub payment_id: Option<String>,
  #[sqlx(flatten)]
  pub shipment: ShipmentDetails,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub shipped_at: Option<DateTime<Utc>>,
  pub delivered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct TimelineEntry {
  pub id: Uuid,
  pub order_id: Uuid,
  pub status: OrderStatus,
  pub description: String,
  pub location: Option<String>,
  pub created_at: DateTime<Utc>,
}

/// An order with its line items and timeline, oldest entry first.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
  #[serde(flatten)]
  pub order: Order,
  pub items: Vec<OrderItem>,
  pub timeline: Vec<TimelineEntry>,
}

/// Line item to persist with a new order; prices are already resolved.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
  pub product_id: Uuid,
  pub product_name: String,
  pub size: Option<String>,
  pub quantity: i32,
  pub unit_price_cents: i64,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
  pub user_id: Uuid,
  pub status: OrderStatus,
  pub total_amount_cents: i64,
  pub currency: String,
  pub shipping_address: ShippingAddress,
  pub payment_gateway_order_id: Option<String>,
  pub payment_id: Option<String>,
  pub items: Vec<NewOrderItem>,
  pub timeline_description: String,
}

/// A status write together with its timeline row.
///
/// `expected_status` is the status the caller validated the transition
/// against; the write is refused if the order moved on in the meantime.
#[derive(Debug, Clone)]
pub struct StatusChange {
  pub order_id: Uuid,
  pub expected_status: OrderStatus,
  pub new_status: OrderStatus,
  pub description: String,
  pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
  pub status: Option<OrderStatus>,
  pub limit: Option<i64>,
  pub offset: Option<i64>,
}

/// Partial update of [`ShipmentDetails`]; `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct ShipmentPatch {
  pub carrier_order_id: Option<String>,
  pub shipment_id: Option<String>,
  pub awb_code: Option<String>,
  pub courier_name: Option<String>,
  pub tracking_url: Option<String>,
  pub pickup_token: Option<String>,
  pub label_url: Option<String>,
  pub invoice_url: Option<String>,
}

impl ShipmentPatch {
  pub fn apply_to(&self, details: &mut ShipmentDetails) {
    let fields = [
      (&self.carrier_order_id, &mut details.carrier_order_id),
      (&self.shipment_id, &mut details.shipment_id),
      (&self.awb_code, &mut details.awb_code),
      (&self.courier_name, &mut details.courier_name),
      (&self.tracking_url, &mut details.tracking_url),
      (&self.pickup_token, &mut details.pickup_token),
      (&self.label_url, &mut details.label_url),
      (&self.invoice_url, &mut details.invoice_url),
    ];
    for (patch, target) in fields {
      if let Some(value) = patch {
        *target = Some(value.clone());
      }
    }
  }
}
