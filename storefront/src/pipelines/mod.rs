// storefront/src/pipelines/mod.rs

//! The storefront's multi-call workflows, run on the `stepflow` engine.

use crate::errors::AppError;
use stepflow::Flows;

pub mod checkout_pipeline;
pub mod contexts;
pub mod shipment_pipeline;

/// Registers every storefront pipeline. Called once while building `AppState`.
pub fn register_all_pipelines(flows: &Flows<AppError>) {
  tracing::info!("Registering storefront pipelines...");
  checkout_pipeline::register_checkout_pipeline(flows);
  shipment_pipeline::register_shipment_pipeline(flows);
  tracing::info!("All storefront pipelines registered.");
}
