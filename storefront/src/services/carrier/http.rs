// storefront/src/services/carrier/http.rs

use super::{
  AwbAssignment, CarrierApi, CarrierOrder, CarrierOrderRequest, CourierOption, InvoiceGenerated, LabelGenerated,
  PickupScheduled, ServiceabilityQuery, TrackingActivity, TrackingSnapshot,
};
use crate::config::CarrierSettings;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{error, info, instrument};

const SERVICE: &str = "carrier";

/// REST client for the logistics aggregator.
pub struct HttpCarrierClient {
  client: reqwest::Client,
  api_base: String,
  api_token: String,
}

// The carrier returns ids as numbers on some endpoints and strings on others.
fn id_string(value: &Value) -> Option<String> {
  match value {
    Value::String(s) if !s.is_empty() => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

fn to_cents(amount: f64) -> i64 {
  (amount * 100.0).round() as i64
}

fn from_cents(cents: i64) -> f64 {
  cents as f64 / 100.0
}

#[derive(Debug, Deserialize)]
struct ServiceabilityResponse {
  #[serde(default)]
  data: Option<ServiceabilityData>,
}

#[derive(Debug, Deserialize)]
struct ServiceabilityData {
  #[serde(default)]
  available_courier_companies: Vec<WireCourier>,
}

#[derive(Debug, Deserialize)]
struct WireCourier {
  courier_company_id: Value,
  courier_name: String,
  #[serde(default)]
  rate: f64,
  #[serde(default)]
  cod_charges: f64,
  #[serde(default)]
  estimated_delivery_days: Option<Value>,
  #[serde(default)]
  etd: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
  order_id: Value,
  shipment_id: Value,
}

#[derive(Debug, Deserialize)]
struct AssignAwbResponse {
  #[serde(default)]
  response: Option<AssignAwbEnvelope>,
}

#[derive(Debug, Deserialize)]
struct AssignAwbEnvelope {
  data: AssignAwbData,
}

#[derive(Debug, Deserialize)]
struct AssignAwbData {
  awb_code: Value,
  #[serde(default)]
  courier_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PickupResponse {
  #[serde(default)]
  response: Option<PickupData>,
}

#[derive(Debug, Deserialize)]
struct PickupData {
  #[serde(default)]
  pickup_token_number: Option<Value>,
  #[serde(default)]
  pickup_scheduled_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LabelResponse {
  #[serde(default)]
  label_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InvoiceResponse {
  #[serde(default)]
  is_invoice_created: bool,
  #[serde(default)]
  invoice_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrackResponse {
  #[serde(default)]
  tracking_data: Option<TrackingData>,
}

#[derive(Debug, Deserialize)]
struct TrackingData {
  #[serde(default)]
  shipment_track: Vec<ShipmentTrack>,
  #[serde(default)]
  shipment_track_activities: Option<Vec<WireActivity>>,
  #[serde(default)]
  track_url: Option<String>,
  #[serde(default)]
  etd: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ShipmentTrack {
  #[serde(default)]
  current_status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireActivity {
  date: String,
  #[serde(default)]
  status: Option<String>,
  #[serde(default, rename = "sr-status-label")]
  sr_status_label: Option<String>,
  #[serde(default)]
  location: Option<String>,
  #[serde(default)]
  activity: Option<String>,
}

impl WireActivity {
  // The aggregator label wins over the courier status code when present.
  fn into_activity(self) -> TrackingActivity {
    let status = self
      .sr_status_label
      .filter(|l| !l.trim().is_empty())
      .or(self.status)
      .unwrap_or_default();
    TrackingActivity {
      date: self.date,
      status,
      location: self.location.filter(|l| !l.is_empty()),
      description: self.activity,
    }
  }
}

#[derive(Debug, Serialize)]
struct WireOrderItem<'a> {
  name: &'a str,
  sku: &'a str,
  units: i32,
  selling_price: f64,
}

impl HttpCarrierClient {
  pub fn new(settings: &CarrierSettings) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(settings.timeout_secs))
      .build()
      .map_err(|e| AppError::Config(format!("Failed to build carrier HTTP client: {}", e)))?;
    Ok(Self {
      client,
      api_base: settings.api_base.trim_end_matches('/').to_string(),
      api_token: settings.api_token.clone(),
    })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/{}", self.api_base, path)
  }

  /// Builds a URL whose trailing segments are escaped individually.
  fn url_with_segments(&self, segments: &[&str]) -> Result<reqwest::Url> {
    let mut url = reqwest::Url::parse(&self.api_base)
      .map_err(|e| AppError::Config(format!("Invalid carrier API base: {}", e)))?;
    url
      .path_segments_mut()
      .map_err(|_| AppError::Config("Carrier API base cannot carry a path".to_string()))?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }

  async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder, endpoint: &'static str) -> Result<T> {
    let response = request
      .bearer_auth(&self.api_token)
      .send()
      .await
      .map_err(|e| {
        error!(endpoint = endpoint, error = %e, "Carrier request failed.");
        AppError::integration(SERVICE, e)
      })?;
    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      error!(endpoint = endpoint, status = status.as_u16(), body = %body, "Carrier rejected the request.");
      return Err(AppError::integration(SERVICE, format!("{} returned HTTP {}", endpoint, status)));
    }
    response.json::<T>().await.map_err(|e| {
      error!(endpoint = endpoint, error = %e, "Carrier response could not be decoded.");
      AppError::integration(SERVICE, e)
    })
  }

  async fn post<T: DeserializeOwned>(
    &self,
    path: &'static str,
    body: &Value,
    idempotency_key: Option<&str>,
  ) -> Result<T> {
    let mut request = self.client.post(self.url(path)).json(body);
    if let Some(key) = idempotency_key {
      request = request.header("Idempotency-Key", key);
    }
    self.send(request, path).await
  }
}

#[async_trait]
impl CarrierApi for HttpCarrierClient {
  #[instrument(name = "carrier::serviceability", skip(self), err(Display))]
  async fn serviceability(&self, query: &ServiceabilityQuery) -> Result<Vec<CourierOption>> {
    let request = self.client.get(self.url("courier/serviceability/")).query(&[
      ("pickup_postcode", query.pickup_postcode.clone()),
      ("delivery_postcode", query.delivery_postcode.clone()),
      ("weight", query.weight_kg.to_string()),
      ("cod", if query.cod { "1" } else { "0" }.to_string()),
    ]);
    let response: ServiceabilityResponse = self.send(request, "courier/serviceability/").await?;
    let couriers = response
      .data
      .map(|d| d.available_courier_companies)
      .unwrap_or_default();

    Ok(
      couriers
        .into_iter()
        .filter_map(|c| {
          let courier_company_id = match &c.courier_company_id {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
          }?;
          Some(CourierOption {
            courier_company_id,
            courier_name: c.courier_name,
            rate_cents: to_cents(c.rate),
            cod_charges_cents: to_cents(c.cod_charges),
            estimated_delivery_days: c.estimated_delivery_days.as_ref().and_then(id_string),
            etd: c.etd,
          })
        })
        .collect(),
    )
  }

  #[instrument(name = "carrier::create_order", skip(self, request), fields(order_id = %request.order_id), err(Display))]
  async fn create_order(&self, request: &CarrierOrderRequest, idempotency_key: &str) -> Result<CarrierOrder> {
    let address = &request.address;
    let items: Vec<WireOrderItem<'_>> = request
      .lines
      .iter()
      .map(|line| WireOrderItem {
        name: &line.name,
        sku: &line.sku,
        units: line.units,
        selling_price: from_cents(line.selling_price_cents),
      })
      .collect();
    let body = json!({
      "order_id": request.order_id,
      "order_date": request.order_date.format("%Y-%m-%d %H:%M").to_string(),
      "pickup_location": request.pickup_location,
      "billing_customer_name": address.full_name,
      "billing_last_name": "",
      "billing_address": address.line1,
      "billing_address_2": address.line2.clone().unwrap_or_default(),
      "billing_city": address.city,
      "billing_state": address.state,
      "billing_pincode": address.postcode,
      "billing_country": address.country,
      "billing_email": request.email.clone().unwrap_or_default(),
      "billing_phone": address.phone,
      "shipping_is_billing": true,
      "order_items": items,
      "payment_method": "Prepaid",
      "sub_total": from_cents(request.sub_total_cents),
      "length": request.package.length_cm,
      "breadth": request.package.breadth_cm,
      "height": request.package.height_cm,
      "weight": request.package.weight_kg,
    });

    let response: CreateOrderResponse = self.post("orders/create/adhoc", &body, Some(idempotency_key)).await?;
    let (Some(carrier_order_id), Some(shipment_id)) = (id_string(&response.order_id), id_string(&response.shipment_id))
    else {
      return Err(AppError::integration(SERVICE, "create order response carried no ids"));
    };
    info!(carrier_order_id = %carrier_order_id, shipment_id = %shipment_id, "Carrier order created.");
    Ok(CarrierOrder {
      carrier_order_id,
      shipment_id,
    })
  }

  #[instrument(name = "carrier::assign_awb", skip(self), err(Display))]
  async fn assign_awb(&self, shipment_id: &str, idempotency_key: &str) -> Result<AwbAssignment> {
    let body = json!({ "shipment_id": shipment_id });
    let response: AssignAwbResponse = self.post("courier/assign/awb", &body, Some(idempotency_key)).await?;
    let data = response
      .response
      .map(|r| r.data)
      .ok_or_else(|| AppError::integration(SERVICE, "AWB assignment response carried no data"))?;
    let awb_code =
      id_string(&data.awb_code).ok_or_else(|| AppError::integration(SERVICE, "AWB assignment carried no code"))?;
    info!(awb_code = %awb_code, "AWB assigned.");
    Ok(AwbAssignment {
      awb_code,
      courier_name: data.courier_name,
    })
  }

  #[instrument(name = "carrier::request_pickup", skip(self), err(Display))]
  async fn request_pickup(&self, shipment_id: &str, idempotency_key: &str) -> Result<PickupScheduled> {
    let body = json!({ "shipment_id": [shipment_id] });
    let response: PickupResponse = self.post("courier/generate/pickup", &body, Some(idempotency_key)).await?;
    Ok(
      response
        .response
        .map(|p| PickupScheduled {
          pickup_token: p.pickup_token_number.as_ref().and_then(id_string),
          scheduled_date: p.pickup_scheduled_date,
        })
        .unwrap_or_default(),
    )
  }

  #[instrument(name = "carrier::generate_label", skip(self), err(Display))]
  async fn generate_label(&self, shipment_id: &str, idempotency_key: &str) -> Result<LabelGenerated> {
    let body = json!({ "shipment_id": [shipment_id] });
    let response: LabelResponse = self.post("courier/generate/label", &body, Some(idempotency_key)).await?;
    Ok(LabelGenerated {
      label_url: response.label_url.filter(|u| !u.is_empty()),
    })
  }

  #[instrument(name = "carrier::generate_invoice", skip(self), err(Display))]
  async fn generate_invoice(&self, carrier_order_ids: &[String]) -> Result<InvoiceGenerated> {
    let body = json!({ "ids": carrier_order_ids });
    let response: InvoiceResponse = self.post("orders/print/invoice", &body, None).await?;
    let invoice_url = response.invoice_url.filter(|u| !u.is_empty());
    Ok(InvoiceGenerated {
      created: response.is_invoice_created && invoice_url.is_some(),
      invoice_url,
    })
  }

  #[instrument(name = "carrier::track_awb", skip(self), err(Display))]
  async fn track_awb(&self, awb_code: &str) -> Result<TrackingSnapshot> {
    let request = self
      .client
      .get(self.url_with_segments(&["courier", "track", "awb", awb_code])?);
    let response: TrackResponse = self.send(request, "courier/track/awb").await?;
    let Some(data) = response.tracking_data else {
      return Ok(TrackingSnapshot::default());
    };
    Ok(TrackingSnapshot {
      current_status: data.shipment_track.into_iter().find_map(|t| t.current_status),
      activities: data
        .shipment_track_activities
        .unwrap_or_default()
        .into_iter()
        .map(WireActivity::into_activity)
        .collect(),
      tracking_url: data.track_url,
      etd: data.etd,
    })
  }
}
