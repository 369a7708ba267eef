// storefront/src/services/shipping.rs

//! Storefront-facing shipping operations on top of [`CarrierApi`].

use crate::db::Repositories;
use crate::errors::{AppError, Result};
use crate::models::{Order, OrderStatus, ShipmentPatch};
use crate::pipelines::contexts::ShipmentCtxData;
use crate::services::carrier::{
  CarrierApi, CourierOption, InvoiceGenerated, PackageDimensions, ServiceabilityQuery, SimplifiedStatus,
  TrackingSnapshot,
};
use crate::services::order_status::{Actor, OrderStatusManager, StatusMeta};
use chrono::{DateTime, NaiveDateTime};
use serde::Serialize;
use std::sync::Arc;
use stepflow::{ContextData, Flows};
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceabilityQuote {
  pub shipping_cost_cents: i64,
  pub cod_charges_cents: i64,
  pub courier_name: String,
  pub courier_company_id: i64,
  pub estimated_delivery_days: Option<String>,
  pub etd: Option<String>,
}

impl From<CourierOption> for ServiceabilityQuote {
  fn from(c: CourierOption) -> Self {
    Self {
      shipping_cost_cents: c.rate_cents,
      cod_charges_cents: c.cod_charges_cents,
      courier_name: c.courier_name,
      courier_company_id: c.courier_company_id,
      estimated_delivery_days: c.estimated_delivery_days,
      etd: c.etd,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingEvent {
  pub status: String,
  pub date: String,
  pub location: Option<String>,
  pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingView {
  pub awb_code: String,
  pub current_status: SimplifiedStatus,
  pub carrier_status: Option<String>,
  /// Oldest first.
  pub timeline: Vec<TrackingEvent>,
  pub tracking_url: Option<String>,
  pub etd: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackingSync {
  pub order: Order,
  pub tracking: TrackingView,
  pub status_changed: bool,
}

/// Cheapest courier; on equal rates the carrier's first listed wins.
pub fn cheapest_courier(options: Vec<CourierOption>) -> Option<CourierOption> {
  options.into_iter().min_by_key(|c| c.rate_cents)
}

fn parse_activity_date(raw: &str) -> Option<NaiveDateTime> {
  let raw = raw.trim();
  NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
    .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M"))
    .ok()
    .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.naive_utc()))
}

/// Flattens a carrier snapshot into the storefront's tracking view.
pub fn tracking_view(awb_code: &str, snapshot: TrackingSnapshot) -> TrackingView {
  let mut timeline: Vec<TrackingEvent> = snapshot
    .activities
    .into_iter()
    .map(|a| TrackingEvent {
      status: a.status,
      date: a.date,
      location: a.location,
      description: a.description,
    })
    .collect();
  // Undated entries go last, otherwise the carrier's order is kept.
  timeline.sort_by_key(|e| {
    let parsed = parse_activity_date(&e.date);
    (parsed.is_none(), parsed)
  });

  let carrier_status = snapshot
    .current_status
    .filter(|s| !s.trim().is_empty())
    .or_else(|| timeline.last().map(|e| e.status.clone()));
  let current_status = carrier_status
    .as_deref()
    .map(SimplifiedStatus::from_carrier_label)
    .unwrap_or(SimplifiedStatus::Unknown);

  TrackingView {
    awb_code: awb_code.to_string(),
    current_status,
    carrier_status,
    timeline,
    tracking_url: snapshot.tracking_url,
    etd: snapshot.etd,
  }
}

#[derive(Clone)]
pub struct ShippingAdapter {
  carrier: Arc<dyn CarrierApi>,
  repos: Repositories,
  flows: Arc<Flows<AppError>>,
  status: OrderStatusManager,
  pickup_postcode: String,
  pickup_location: String,
}

impl ShippingAdapter {
  pub fn new(
    carrier: Arc<dyn CarrierApi>,
    repos: Repositories,
    flows: Arc<Flows<AppError>>,
    status: OrderStatusManager,
    pickup_postcode: impl Into<String>,
    pickup_location: impl Into<String>,
  ) -> Self {
    Self {
      carrier,
      repos,
      flows,
      status,
      pickup_postcode: pickup_postcode.into(),
      pickup_location: pickup_location.into(),
    }
  }

  pub fn pickup_postcode(&self) -> &str {
    &self.pickup_postcode
  }

  async fn load_order(&self, order_id: Uuid) -> Result<Order> {
    self
      .repos
      .orders
      .find_order(order_id)
      .await?
      .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))
  }

  #[instrument(name = "shipping::check_serviceability", skip(self), err(Display))]
  pub async fn check_serviceability(&self, query: &ServiceabilityQuery) -> Result<ServiceabilityQuote> {
    if query.delivery_postcode.trim().is_empty() || query.pickup_postcode.trim().is_empty() {
      return Err(AppError::Validation("Pickup and delivery postcodes are required".to_string()));
    }
    if !(query.weight_kg > 0.0) {
      return Err(AppError::Validation("Weight must be greater than zero".to_string()));
    }
    let options = self.carrier.serviceability(query).await?;
    let count = options.len();
    let cheapest = cheapest_courier(options).ok_or_else(|| {
      AppError::NotServiceable(format!("No courier serves postcode {}", query.delivery_postcode))
    })?;
    info!(couriers = count, courier = %cheapest.courier_name, rate_cents = cheapest.rate_cents, "Courier selected.");
    Ok(cheapest.into())
  }

  /// Runs (or resumes) the shipment pipeline for `order_id`, then marks the
  /// order shipped.
  #[instrument(name = "shipping::create_shipment", skip(self, package), fields(order_id = %order_id), err(Display))]
  pub async fn create_shipment(&self, order_id: Uuid, package: PackageDimensions) -> Result<Order> {
    let order = self.load_order(order_id).await?;
    if !matches!(
      order.status,
      OrderStatus::Confirmed | OrderStatus::Processing | OrderStatus::Shipped
    ) {
      return Err(AppError::Validation(format!(
        "Order {} cannot be shipped while {}",
        order_id, order.status
      )));
    }
    if package.weight_kg <= 0.0 {
      return Err(AppError::Validation("Weight must be greater than zero".to_string()));
    }

    let items = self.repos.orders.order_items(order_id).await?;
    let customer_email = self
      .repos
      .customers
      .find_profile(order.user_id)
      .await?
      .and_then(|p| p.email);
    let run_key = order_id.to_string();
    let ctx = ContextData::new(ShipmentCtxData {
      orders: self.repos.orders.clone(),
      carrier: self.carrier.clone(),
      run_key: run_key.clone(),
      order,
      items,
      customer_email,
      package,
      pickup_location: self.pickup_location.clone(),
    });

    self
      .flows
      .run_journaled(ctx.clone(), &run_key, self.repos.shipments.as_ref())
      .await?;

    let shipped = ctx.with(|d| d.order.clone());
    if !matches!(shipped.status, OrderStatus::Confirmed | OrderStatus::Processing) {
      return Ok(shipped);
    }
    let description = match &shipped.shipment.awb_code {
      Some(awb) => format!("Shipment created with AWB {}", awb),
      None => "Shipment created".to_string(),
    };
    self
      .status
      .update_status(
        &Actor::System("shipment"),
        order_id,
        OrderStatus::Shipped,
        StatusMeta {
          description: Some(description),
          location: None,
        },
      )
      .await
  }

  #[instrument(name = "shipping::track_by_awb", skip(self), err(Display))]
  pub async fn track_by_awb(&self, awb_code: &str) -> Result<TrackingView> {
    let awb_code = awb_code.trim();
    if awb_code.is_empty() {
      return Err(AppError::Validation("AWB code is required".to_string()));
    }
    let snapshot = self.carrier.track_awb(awb_code).await?;
    Ok(tracking_view(awb_code, snapshot))
  }

  pub async fn generate_invoice(&self, carrier_order_ids: &[String]) -> Result<InvoiceGenerated> {
    if carrier_order_ids.is_empty() {
      return Err(AppError::Validation("At least one carrier order id is required".to_string()));
    }
    self.carrier.generate_invoice(carrier_order_ids).await
  }

  /// Generates the invoice for one order and stores its URL.
  #[instrument(name = "shipping::invoice_order", skip(self), err(Display))]
  pub async fn invoice_order(&self, order_id: Uuid) -> Result<InvoiceGenerated> {
    let order = self.load_order(order_id).await?;
    let carrier_order_id = order
      .shipment
      .carrier_order_id
      .ok_or_else(|| AppError::Validation(format!("Order {} has no carrier order yet", order_id)))?;
    let invoice = self.generate_invoice(&[carrier_order_id]).await?;
    if let Some(url) = invoice.invoice_url.clone().filter(|_| invoice.created) {
      self
        .repos
        .orders
        .save_shipment_details(
          order_id,
          &ShipmentPatch {
            invoice_url: Some(url),
            ..Default::default()
          },
        )
        .await?;
    }
    Ok(invoice)
  }

  /// Pulls carrier tracking for the order's AWB and applies the mapped status
  /// when the head differs and the transition policy accepts it.
  #[instrument(name = "shipping::sync_tracking", skip(self), err(Display))]
  pub async fn sync_tracking(&self, order_id: Uuid) -> Result<TrackingSync> {
    let order = self.load_order(order_id).await?;
    let awb_code = order
      .shipment
      .awb_code
      .clone()
      .ok_or_else(|| AppError::Validation(format!("Order {} has no AWB yet", order_id)))?;
    let tracking = self.track_by_awb(&awb_code).await?;

    let Some(target) = tracking.current_status.as_order_status() else {
      return Ok(TrackingSync {
        order,
        tracking,
        status_changed: false,
      });
    };
    if target == order.status || !self.status.policy().allows(order.status, target) {
      return Ok(TrackingSync {
        order,
        tracking,
        status_changed: false,
      });
    }

    let latest = tracking.timeline.last();
    let meta = StatusMeta {
      description: latest.and_then(|e| e.description.clone()),
      location: latest.and_then(|e| e.location.clone()),
    };
    let updated = self
      .status
      .update_status(&Actor::System("tracking_sync"), order_id, target, meta)
      .await?;
    Ok(TrackingSync {
      order: updated,
      tracking,
      status_changed: true,
    })
  }

  /// Applies a carrier status push. Unknown AWBs and unmapped or disallowed
  /// statuses are acknowledged without a change.
  #[instrument(name = "shipping::apply_carrier_event", skip(self), err(Display))]
  pub async fn apply_carrier_event(
    &self,
    awb_code: &str,
    carrier_status: &str,
    location: Option<String>,
  ) -> Result<Option<Order>> {
    let Some(order) = self.repos.orders.find_order_by_awb(awb_code).await? else {
      info!("Carrier event for an unknown AWB ignored.");
      return Ok(None);
    };
    let Some(target) = SimplifiedStatus::from_carrier_label(carrier_status).as_order_status() else {
      info!(order_id = %order.id, "Carrier status has no storefront equivalent; ignored.");
      return Ok(None);
    };
    let repeat_scan = target == OrderStatus::InTransit && order.status == OrderStatus::InTransit;
    if (target == order.status && !repeat_scan) || !self.status.policy().allows(order.status, target) {
      warn!(order_id = %order.id, from = %order.status, to = %target, "Carrier event not applied.");
      return Ok(None);
    }
    let updated = self
      .status
      .update_status(
        &Actor::System("carrier_webhook"),
        order.id,
        target,
        StatusMeta {
          description: Some(format!("Carrier reported: {}", carrier_status.trim())),
          location,
        },
      )
      .await?;
    Ok(Some(updated))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::services::carrier::TrackingActivity;

  fn courier(name: &str, rate_cents: i64) -> CourierOption {
    CourierOption {
      courier_company_id: rate_cents,
      courier_name: name.to_string(),
      rate_cents,
      cod_charges_cents: 0,
      estimated_delivery_days: None,
      etd: None,
    }
  }

  #[test]
  fn cheapest_courier_prefers_first_on_ties() {
    let picked = cheapest_courier(vec![courier("Bluedart", 120), courier("Delhivery", 80), courier("Xpress", 80)]);
    assert_eq!(picked.unwrap().courier_name, "Delhivery");
    assert!(cheapest_courier(vec![]).is_none());
  }

  #[test]
  fn empty_snapshot_is_unknown_with_no_events() {
    let view = tracking_view("AWB1", TrackingSnapshot::default());
    assert_eq!(view.current_status, SimplifiedStatus::Unknown);
    assert!(view.timeline.is_empty());
    assert_eq!(view.carrier_status, None);
  }

  #[test]
  fn activities_are_sorted_oldest_first() {
    let activity = |date: &str, status: &str| TrackingActivity {
      date: date.to_string(),
      status: status.to_string(),
      location: None,
      description: None,
    };
    let view = tracking_view(
      "AWB2",
      TrackingSnapshot {
        current_status: None,
        activities: vec![
          activity("2026-03-02 18:10:00", "IN TRANSIT"),
          activity("2026-03-01 09:00:00", "PICKED UP"),
          activity("2026-03-03 11:45:00", "DELIVERED"),
        ],
        tracking_url: None,
        etd: None,
      },
    );
    let statuses: Vec<&str> = view.timeline.iter().map(|e| e.status.as_str()).collect();
    assert_eq!(statuses, ["PICKED UP", "IN TRANSIT", "DELIVERED"]);
    assert_eq!(view.current_status, SimplifiedStatus::Delivered);
  }
}
