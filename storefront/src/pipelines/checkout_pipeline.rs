// storefront/src/pipelines/checkout_pipeline.rs

use crate::errors::AppError;
use crate::models::{NewNotification, NewOrder, OrderStatus};
use crate::pipelines::contexts::CheckoutCtxData;
use crate::services::pricing::price_cart;
use stepflow::{ContextData, Flows, Pipeline, PipelineControl, StepDef};
use tracing::{info, warn};

pub const ORDER_PLACED_DESCRIPTION: &str = "Order placed and payment confirmed";

pub fn checkout_pipeline() -> Pipeline<CheckoutCtxData, AppError> {
  let mut p = Pipeline::<CheckoutCtxData, AppError>::new(
    "checkout",
    vec![
      StepDef::required("validate_cart"),
      StepDef::required("verify_payment"),
      StepDef::required("persist_order"),
      StepDef::optional("notify_admin"),
    ],
  );

  p.on_step("validate_cart", |ctx: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (catalog, items, address) = ctx.with(|d| (d.catalog.clone(), d.items.clone(), d.shipping_address.clone()));
      address.validate()?;
      let priced = price_cart(catalog.as_ref(), &items).await?;
      info!(lines = priced.lines.len(), total_cents = priced.total_cents, "Cart validated.");
      ctx.update(|d| d.priced = Some(priced));
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_step("verify_payment", |ctx: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (payments, payment, currency, total_cents) = ctx.with(|d| {
        (
          d.payments.clone(),
          d.payment.clone(),
          d.currency.clone(),
          d.priced.as_ref().map(|p| p.total_cents),
        )
      });
      let total_cents =
        total_cents.ok_or_else(|| AppError::Internal("verify_payment ran before validate_cart".to_string()))?;

      if !payments.verify_payment_signature(&payment.gateway_order_id, &payment.payment_id, &payment.signature) {
        warn!(gateway_order_id = %payment.gateway_order_id, "Payment signature mismatch.");
        return Err(AppError::Validation("Payment verification failed".to_string()));
      }

      let gateway_order = payments.fetch_order(&payment.gateway_order_id).await?;
      if gateway_order.amount != total_cents || !gateway_order.currency.eq_ignore_ascii_case(&currency) {
        warn!(
          gateway_amount = gateway_order.amount,
          cart_amount = total_cents,
          "Paid amount does not match the cart."
        );
        return Err(AppError::Validation("Payment amount does not match the order total".to_string()));
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_step("persist_order", |ctx: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (orders, new_order) = ctx.with(|d| {
        let new_order = d.priced.as_ref().map(|priced| NewOrder {
          user_id: d.user_id,
          status: OrderStatus::Confirmed,
          total_amount_cents: priced.total_cents,
          currency: d.currency.clone(),
          shipping_address: d.shipping_address.clone(),
          payment_gateway_order_id: Some(d.payment.gateway_order_id.clone()),
          payment_id: Some(d.payment.payment_id.clone()),
          items: priced.lines.clone(),
          timeline_description: ORDER_PLACED_DESCRIPTION.to_string(),
        });
        (d.orders.clone(), new_order)
      });
      let new_order =
        new_order.ok_or_else(|| AppError::Internal("persist_order ran before validate_cart".to_string()))?;

      let order = orders.create_order(new_order).await?;
      info!(order_id = %order.id, total_cents = order.total_amount_cents, "Order persisted.");
      ctx.update(|d| d.order = Some(order));
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // The order is already placed; a failed notification must not fail checkout.
  p.on_step("notify_admin", |ctx: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (content, order) = ctx.with(|d| (d.content.clone(), d.order.clone()));
      let Some(order) = order else {
        return Ok::<_, AppError>(PipelineControl::Continue);
      };
      let notification = NewNotification {
        kind: "new_order".to_string(),
        title: "New order received".to_string(),
        message: format!(
          "Order {} for {} {:.2} from {}",
          order.id,
          order.currency,
          order.total_amount_cents as f64 / 100.0,
          order.shipping_address.full_name
        ),
        order_id: Some(order.id),
      };
      match content.create_notification(notification).await {
        Ok(_) => ctx.update(|d| d.admin_notified = true),
        Err(e) => warn!(order_id = %order.id, error = %e, "Failed to record new-order notification."),
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p
}

pub fn register_checkout_pipeline(flows: &Flows<AppError>) {
  flows.register(checkout_pipeline());
}
