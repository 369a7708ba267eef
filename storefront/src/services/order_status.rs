// storefront/src/services/order_status.rs

//! Order status changes. Every change goes through [`OrderStatusManager`],
//! which checks the configured [`TransitionPolicy`] and writes the status
//! together with its timeline row.

use crate::db::OrderRepository;
use crate::errors::{AppError, Result};
use crate::models::{Order, OrderStatus, Role, StatusChange};
use crate::services::access::AuthContext;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
  /// Forward-only fulfilment, with cancellation and refunds at fixed points.
  #[default]
  Strict,
  /// Any status may replace any other.
  Permissive,
}

impl FromStr for TransitionPolicy {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "strict" => Ok(TransitionPolicy::Strict),
      "permissive" => Ok(TransitionPolicy::Permissive),
      other => Err(AppError::Config(format!("Invalid ORDER_STATUS_POLICY '{}'", other))),
    }
  }
}

/// Position along the fulfilment chain; `None` for cancelled and refunded.
fn fulfilment_rank(status: OrderStatus) -> Option<u8> {
  match status {
    OrderStatus::Pending => Some(0),
    OrderStatus::Confirmed => Some(1),
    OrderStatus::Processing => Some(2),
    OrderStatus::Shipped => Some(3),
    OrderStatus::InTransit => Some(4),
    OrderStatus::Delivered => Some(5),
    OrderStatus::Cancelled | OrderStatus::Refunded => None,
  }
}

impl TransitionPolicy {
  pub fn allows(&self, from: OrderStatus, to: OrderStatus) -> bool {
    if *self == TransitionPolicy::Permissive {
      return true;
    }
    use OrderStatus::*;
    match (from, to) {
      (Refunded, _) => false,
      (Confirmed | Processing | Delivered | Cancelled, Refunded) => true,
      (_, Refunded) => false,
      (Pending | Confirmed | Processing | Shipped | InTransit, Cancelled) => true,
      (_, Cancelled) => false,
      (Cancelled | Delivered, _) => false,
      // repeated carrier scans while moving between hubs
      (InTransit, InTransit) => true,
      _ => match (fulfilment_rank(from), fulfilment_rank(to)) {
        (Some(from_rank), Some(to_rank)) => to_rank > from_rank,
        _ => false,
      },
    }
  }

  pub fn check(&self, from: OrderStatus, to: OrderStatus) -> Result<()> {
    if self.allows(from, to) {
      Ok(())
    } else {
      Err(AppError::Validation(format!(
        "Cannot change order status from {} to {}",
        from, to
      )))
    }
  }
}

/// Who is changing the status.
#[derive(Debug, Clone)]
pub enum Actor {
  User(AuthContext),
  /// Internal callers such as the carrier webhook or the shipment run.
  System(&'static str),
}

impl Actor {
  fn label(&self) -> String {
    match self {
      Actor::User(ctx) => format!("user:{}", ctx.user_id),
      Actor::System(name) => format!("system:{}", name),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusMeta {
  pub description: Option<String>,
  pub location: Option<String>,
}

#[derive(Clone)]
pub struct OrderStatusManager {
  orders: Arc<dyn OrderRepository>,
  policy: TransitionPolicy,
}

impl OrderStatusManager {
  pub fn new(orders: Arc<dyn OrderRepository>, policy: TransitionPolicy) -> Self {
    Self { orders, policy }
  }

  pub fn policy(&self) -> TransitionPolicy {
    self.policy
  }

  #[instrument(
    name = "order_status::update_status",
    skip(self, actor, meta),
    fields(actor = %actor.label(), order_id = %order_id, new_status = %new_status),
    err(Display)
  )]
  pub async fn update_status(
    &self,
    actor: &Actor,
    order_id: Uuid,
    new_status: OrderStatus,
    meta: StatusMeta,
  ) -> Result<Order> {
    if let Actor::User(ctx) = actor {
      if ctx.role != Role::Admin {
        warn!("Non-admin attempted an order status change.");
        return Err(AppError::Forbidden("Admin access required".to_string()));
      }
    }

    let order = self
      .orders
      .find_order(order_id)
      .await?
      .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;

    self.policy.check(order.status, new_status)?;

    let description = meta
      .description
      .filter(|d| !d.trim().is_empty())
      .unwrap_or_else(|| format!("Order status changed to {}", new_status));
    let updated = self
      .orders
      .apply_status_change(StatusChange {
        order_id,
        expected_status: order.status,
        new_status,
        description,
        location: meta.location.filter(|l| !l.trim().is_empty()),
      })
      .await?;

    info!(from = %order.status, to = %updated.status, "Order status updated.");
    Ok(updated)
  }
}
