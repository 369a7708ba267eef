// storefront/src/services/payment_gateway.rs

//! Payment gateway client: order creation and payment signature checks.

use crate::config::PaymentSettings;
use crate::errors::{AppError, Result};
use crate::services::signature;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info, instrument};

/// An order as the gateway knows it. Amounts are in the currency's minor unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
  pub id: String,
  pub amount: i64,
  pub currency: String,
  #[serde(default)]
  pub receipt: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  /// Public key id the storefront's checkout widget is opened with.
  fn key_id(&self) -> &str;

  async fn create_order(&self, amount_cents: i64, currency: &str, receipt: &str) -> Result<GatewayOrder>;

  async fn fetch_order(&self, gateway_order_id: &str) -> Result<GatewayOrder>;

  /// True iff `signature` is the HMAC of `"<gateway_order_id>|<payment_id>"`.
  fn verify_payment_signature(&self, gateway_order_id: &str, payment_id: &str, signature: &str) -> bool;
}

pub fn payment_signature_message(gateway_order_id: &str, payment_id: &str) -> String {
  format!("{}|{}", gateway_order_id, payment_id)
}

pub fn verify_payment_signature(key_secret: &str, gateway_order_id: &str, payment_id: &str, signature: &str) -> bool {
  let message = payment_signature_message(gateway_order_id, payment_id);
  signature::verify_hex(key_secret, message.as_bytes(), signature)
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
  amount: i64,
  currency: &'a str,
  receipt: &'a str,
}

pub struct HttpPaymentGateway {
  client: reqwest::Client,
  api_base: String,
  key_id: String,
  key_secret: String,
}

impl HttpPaymentGateway {
  pub fn new(settings: &PaymentSettings, timeout: Duration) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| AppError::Config(format!("Failed to build payment HTTP client: {}", e)))?;
    Ok(Self {
      client,
      api_base: settings.api_base.trim_end_matches('/').to_string(),
      key_id: settings.key_id.clone(),
      key_secret: settings.key_secret.clone(),
    })
  }

  async fn read_order(response: reqwest::Response) -> Result<GatewayOrder> {
    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      error!(status = status.as_u16(), body = %body, "Payment gateway rejected the request.");
      return Err(AppError::integration("payment_gateway", format!("HTTP {}", status)));
    }
    response
      .json::<GatewayOrder>()
      .await
      .map_err(|e| AppError::integration("payment_gateway", e))
  }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
  fn key_id(&self) -> &str {
    &self.key_id
  }

  #[instrument(name = "payment_gateway::create_order", skip(self), err(Display))]
  async fn create_order(&self, amount_cents: i64, currency: &str, receipt: &str) -> Result<GatewayOrder> {
    let response = self
      .client
      .post(format!("{}/orders", self.api_base))
      .basic_auth(&self.key_id, Some(&self.key_secret))
      .json(&CreateOrderBody {
        amount: amount_cents,
        currency,
        receipt,
      })
      .send()
      .await
      .map_err(|e| AppError::integration("payment_gateway", e))?;
    let order = Self::read_order(response).await?;
    info!(gateway_order_id = %order.id, "Gateway order created.");
    Ok(order)
  }

  #[instrument(name = "payment_gateway::fetch_order", skip(self), err(Display))]
  async fn fetch_order(&self, gateway_order_id: &str) -> Result<GatewayOrder> {
    let response = self
      .client
      .get(format!("{}/orders/{}", self.api_base, gateway_order_id))
      .basic_auth(&self.key_id, Some(&self.key_secret))
      .send()
      .await
      .map_err(|e| AppError::integration("payment_gateway", e))?;
    Self::read_order(response).await
  }

  fn verify_payment_signature(&self, gateway_order_id: &str, payment_id: &str, signature: &str) -> bool {
    verify_payment_signature(&self.key_secret, gateway_order_id, payment_id, signature)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_only_the_exact_signature() {
    let secret = "gateway_secret";
    let good = signature::sign_hex(secret, payment_signature_message("order_A1", "pay_B2").as_bytes());
    assert!(verify_payment_signature(secret, "order_A1", "pay_B2", &good));

    // every single-character mutation of the signature is rejected
    for idx in 0..good.len() {
      let mut mutated: Vec<char> = good.chars().collect();
      mutated[idx] = if mutated[idx] == '0' { '1' } else { '0' };
      let mutated: String = mutated.into_iter().collect();
      assert!(!verify_payment_signature(secret, "order_A1", "pay_B2", &mutated), "index {}", idx);
    }

    assert!(!verify_payment_signature(secret, "order_A1", "pay_B3", &good));
    assert!(!verify_payment_signature(secret, "order_A2", "pay_B2", &good));
  }
}
