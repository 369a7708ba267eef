// storefront/src/pipelines/shipment_pipeline.rs

//! Carrier shipment creation as a journaled pipeline.
//!
//! Each step sends its idempotency key to the carrier and writes its outputs
//! onto the order row before the journal records it. A rerun for the same
//! order resumes after the last recorded step.

use crate::errors::AppError;
use crate::models::ShipmentPatch;
use crate::pipelines::contexts::ShipmentCtxData;
use crate::services::carrier::{CarrierOrderLine, CarrierOrderRequest};
use stepflow::{idempotency_key, ContextData, Flows, Pipeline, PipelineControl, StepDef};
use tracing::info;

pub const CREATE_CARRIER_ORDER: &str = "create_carrier_order";
pub const ASSIGN_AWB: &str = "assign_awb";
pub const REQUEST_PICKUP: &str = "request_pickup";
pub const GENERATE_LABEL: &str = "generate_label";

async fn persist(ctx: &ContextData<ShipmentCtxData>, patch: ShipmentPatch) -> Result<(), AppError> {
  let (orders, order_id) = ctx.with(|d| (d.orders.clone(), d.order.id));
  let order = orders.save_shipment_details(order_id, &patch).await?;
  ctx.update(|d| d.order = order);
  Ok(())
}

fn shipment_id(data: &ShipmentCtxData) -> Result<String, AppError> {
  data.order.shipment.shipment_id.clone().ok_or_else(|| {
    AppError::Internal(format!("Order {} has no carrier shipment id", data.order.id))
  })
}

fn carrier_request(data: &ShipmentCtxData) -> CarrierOrderRequest {
  CarrierOrderRequest {
    order_id: data.order.id.to_string(),
    order_date: data.order.created_at,
    pickup_location: data.pickup_location.clone(),
    address: data.order.shipping_address.clone(),
    email: data.customer_email.clone(),
    lines: data
      .items
      .iter()
      .map(|item| CarrierOrderLine {
        name: item.product_name.clone(),
        sku: match &item.size {
          Some(size) => format!("{}-{}", item.product_id.simple(), size),
          None => item.product_id.simple().to_string(),
        },
        units: item.quantity,
        selling_price_cents: item.unit_price_cents,
      })
      .collect(),
    sub_total_cents: data.order.total_amount_cents,
    package: data.package,
  }
}

pub fn shipment_pipeline() -> Pipeline<ShipmentCtxData, AppError> {
  let mut p = Pipeline::<ShipmentCtxData, AppError>::new(
    "shipment",
    vec![
      StepDef::required(CREATE_CARRIER_ORDER)
        .skip_if(|ctx: ContextData<ShipmentCtxData>| ctx.with(|d| d.order.shipment.shipment_id.is_some())),
      StepDef::required(ASSIGN_AWB)
        .skip_if(|ctx: ContextData<ShipmentCtxData>| ctx.with(|d| d.order.shipment.awb_code.is_some())),
      StepDef::required(REQUEST_PICKUP),
      StepDef::required(GENERATE_LABEL),
    ],
  );

  p.on_step(CREATE_CARRIER_ORDER, |ctx: ContextData<ShipmentCtxData>| {
    Box::pin(async move {
      let (carrier, request, key) = ctx.with(|d| {
        (
          d.carrier.clone(),
          carrier_request(d),
          idempotency_key(&d.run_key, CREATE_CARRIER_ORDER),
        )
      });
      let created = carrier.create_order(&request, &key).await?;
      persist(
        &ctx,
        ShipmentPatch {
          carrier_order_id: Some(created.carrier_order_id),
          shipment_id: Some(created.shipment_id),
          ..Default::default()
        },
      )
      .await?;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_step(ASSIGN_AWB, |ctx: ContextData<ShipmentCtxData>| {
    Box::pin(async move {
      let (carrier, shipment_id, key) =
        ctx.with(|d| Ok::<_, AppError>((d.carrier.clone(), shipment_id(d)?, idempotency_key(&d.run_key, ASSIGN_AWB))))?;
      let assignment = carrier.assign_awb(&shipment_id, &key).await?;
      info!(awb_code = %assignment.awb_code, "AWB recorded for order.");
      persist(
        &ctx,
        ShipmentPatch {
          awb_code: Some(assignment.awb_code),
          courier_name: assignment.courier_name,
          ..Default::default()
        },
      )
      .await?;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_step(REQUEST_PICKUP, |ctx: ContextData<ShipmentCtxData>| {
    Box::pin(async move {
      let (carrier, shipment_id, key) = ctx.with(|d| {
        Ok::<_, AppError>((d.carrier.clone(), shipment_id(d)?, idempotency_key(&d.run_key, REQUEST_PICKUP)))
      })?;
      let pickup = carrier.request_pickup(&shipment_id, &key).await?;
      if let Some(date) = &pickup.scheduled_date {
        info!(scheduled_date = %date, "Pickup scheduled.");
      }
      persist(
        &ctx,
        ShipmentPatch {
          pickup_token: pickup.pickup_token,
          ..Default::default()
        },
      )
      .await?;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_step(GENERATE_LABEL, |ctx: ContextData<ShipmentCtxData>| {
    Box::pin(async move {
      let (carrier, shipment_id, key) = ctx.with(|d| {
        Ok::<_, AppError>((d.carrier.clone(), shipment_id(d)?, idempotency_key(&d.run_key, GENERATE_LABEL)))
      })?;
      let label = carrier.generate_label(&shipment_id, &key).await?;
      persist(
        &ctx,
        ShipmentPatch {
          label_url: label.label_url,
          ..Default::default()
        },
      )
      .await?;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p
}

pub fn register_shipment_pipeline(flows: &Flows<AppError>) {
  flows.register(shipment_pipeline());
}
