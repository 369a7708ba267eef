// storefront/src/models/dashboard.rs

use serde::Serialize;

/// Point-in-time counts for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
  pub total_orders: i64,
  /// Orders that are pending, confirmed or processing.
  pub pending_orders: i64,
  /// Sum over orders that are neither cancelled nor refunded.
  pub revenue_cents: i64,
  /// Active products at or below their low-stock threshold.
  pub low_stock: i64,
  pub unread_notifications: i64,
  pub total_customers: i64,
}
