// storefront/tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use boutique_storefront::config::AppConfig;
use boutique_storefront::db::memory::MemoryStore;
use boutique_storefront::db::{CatalogRepository, OrderRepository, Repositories};
use boutique_storefront::errors::{AppError, Result};
use boutique_storefront::models::{
  NewOrder, NewOrderItem, Order, OrderStatus, Product, ProductInput, Role, ShippingAddress, StatusChange,
};
use boutique_storefront::services::access::TokenClaims;
use boutique_storefront::services::carrier::{
  AwbAssignment, CarrierApi, CarrierOrder, CarrierOrderRequest, CourierOption, InvoiceGenerated, LabelGenerated,
  PackageDimensions, PickupScheduled, ServiceabilityQuery, TrackingSnapshot,
};
use boutique_storefront::services::payment_gateway::{self, GatewayOrder, PaymentGateway};
use boutique_storefront::services::signature;
use boutique_storefront::AppState;
use jsonwebtoken::{EncodingKey, Header};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use stepflow::MemoryJournal;
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-jwt-secret";
pub const GATEWAY_SECRET: &str = "integration-gateway-secret";
pub const WEBHOOK_SECRET: &str = "integration-webhook-secret";
pub const TEST_AWB: &str = "AWB100200300";

static TRACING: Lazy<()> = Lazy::new(|| {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
  fmt().with_env_filter(filter).with_test_writer().init();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING);
}

/// Builds the actix test service for a [`TestApp`].
macro_rules! test_service {
  ($app:expr) => {
    actix_web::test::init_service(
      actix_web::App::new()
        .app_data(actix_web::web::Data::new($app.state.clone()))
        .configure(boutique_storefront::web::configure_app_routes),
    )
    .await
  };
}

pub fn test_config(policy: &str) -> AppConfig {
  let vars: HashMap<&str, String> = HashMap::from([
    ("STORE_BACKEND", "memory".to_string()),
    ("AUTH_JWT_SECRET", JWT_SECRET.to_string()),
    ("PAYMENT_API_BASE", "http://payments.invalid/v1".to_string()),
    ("PAYMENT_KEY_ID", "key_test".to_string()),
    ("PAYMENT_KEY_SECRET", GATEWAY_SECRET.to_string()),
    ("CARRIER_API_BASE", "http://carrier.invalid/v1/external".to_string()),
    ("CARRIER_API_TOKEN", "carrier-token".to_string()),
    ("CARRIER_WEBHOOK_SECRET", WEBHOOK_SECRET.to_string()),
    ("CARRIER_PICKUP_POSTCODE", "110001".to_string()),
    ("ORDER_STATUS_POLICY", policy.to_string()),
  ]);
  AppConfig::from_lookup(|name| vars.get(name).cloned()).expect("test configuration should load")
}

// --- Payment gateway ---

/// Gateway double that signs with [`GATEWAY_SECRET`] and remembers the orders it opened.
#[derive(Default)]
pub struct FakeGateway {
  orders: Mutex<HashMap<String, GatewayOrder>>,
}

impl FakeGateway {
  /// Registers a gateway order as if the customer had opened and paid it.
  pub fn insert_order(&self, id: &str, amount: i64, currency: &str) {
    self.orders.lock().insert(
      id.to_string(),
      GatewayOrder {
        id: id.to_string(),
        amount,
        currency: currency.to_string(),
        receipt: None,
      },
    );
  }

  pub fn sign(gateway_order_id: &str, payment_id: &str) -> String {
    let message = payment_gateway::payment_signature_message(gateway_order_id, payment_id);
    signature::sign_hex(GATEWAY_SECRET, message.as_bytes())
  }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
  fn key_id(&self) -> &str {
    "key_test"
  }

  async fn create_order(&self, amount_cents: i64, currency: &str, receipt: &str) -> Result<GatewayOrder> {
    let mut orders = self.orders.lock();
    let order = GatewayOrder {
      id: format!("order_test_{}", orders.len() + 1),
      amount: amount_cents,
      currency: currency.to_string(),
      receipt: Some(receipt.to_string()),
    };
    orders.insert(order.id.clone(), order.clone());
    Ok(order)
  }

  async fn fetch_order(&self, gateway_order_id: &str) -> Result<GatewayOrder> {
    self
      .orders
      .lock()
      .get(gateway_order_id)
      .cloned()
      .ok_or_else(|| AppError::integration("payment_gateway", format!("unknown order {}", gateway_order_id)))
  }

  fn verify_payment_signature(&self, gateway_order_id: &str, payment_id: &str, signature: &str) -> bool {
    payment_gateway::verify_payment_signature(GATEWAY_SECRET, gateway_order_id, payment_id, signature)
  }
}

// --- Carrier ---

/// Carrier double with per-method call logs and one-shot failure injection.
#[derive(Default)]
pub struct FakeCarrier {
  couriers: Mutex<Vec<CourierOption>>,
  tracking: Mutex<TrackingSnapshot>,
  fail_once: Mutex<Option<&'static str>>,
  calls: Mutex<Vec<(&'static str, String)>>,
  packages: Mutex<Vec<PackageDimensions>>,
}

impl FakeCarrier {
  pub fn set_couriers(&self, couriers: Vec<CourierOption>) {
    *self.couriers.lock() = couriers;
  }

  pub fn set_tracking(&self, snapshot: TrackingSnapshot) {
    *self.tracking.lock() = snapshot;
  }

  /// The next call to `method` fails with an integration error.
  pub fn fail_next(&self, method: &'static str) {
    *self.fail_once.lock() = Some(method);
  }

  pub fn calls_to(&self, method: &str) -> usize {
    self.calls.lock().iter().filter(|(m, _)| *m == method).count()
  }

  /// Idempotency keys sent to `method`, in call order.
  pub fn keys_for(&self, method: &str) -> Vec<String> {
    self
      .calls
      .lock()
      .iter()
      .filter(|(m, _)| *m == method)
      .map(|(_, key)| key.clone())
      .collect()
  }

  /// The parcel sent with the most recent carrier order.
  pub fn last_package(&self) -> Option<PackageDimensions> {
    self.packages.lock().last().copied()
  }

  fn record(&self, method: &'static str, key: &str) -> Result<()> {
    self.calls.lock().push((method, key.to_string()));
    let mut fail = self.fail_once.lock();
    if *fail == Some(method) {
      *fail = None;
      return Err(AppError::integration("carrier", format!("injected failure in {}", method)));
    }
    Ok(())
  }
}

pub fn courier(id: i64, name: &str, rate_cents: i64) -> CourierOption {
  CourierOption {
    courier_company_id: id,
    courier_name: name.to_string(),
    rate_cents,
    cod_charges_cents: 0,
    estimated_delivery_days: Some("4".to_string()),
    etd: None,
  }
}

#[async_trait]
impl CarrierApi for FakeCarrier {
  async fn serviceability(&self, query: &ServiceabilityQuery) -> Result<Vec<CourierOption>> {
    self.record("serviceability", &query.delivery_postcode)?;
    Ok(self.couriers.lock().clone())
  }

  async fn create_order(&self, request: &CarrierOrderRequest, idempotency_key: &str) -> Result<CarrierOrder> {
    self.record("create_order", idempotency_key)?;
    self.packages.lock().push(request.package);
    Ok(CarrierOrder {
      carrier_order_id: format!("CO-{}", request.order_id),
      shipment_id: "SH-1".to_string(),
    })
  }

  async fn assign_awb(&self, _shipment_id: &str, idempotency_key: &str) -> Result<AwbAssignment> {
    self.record("assign_awb", idempotency_key)?;
    Ok(AwbAssignment {
      awb_code: TEST_AWB.to_string(),
      courier_name: Some("Delhivery".to_string()),
    })
  }

  async fn request_pickup(&self, _shipment_id: &str, idempotency_key: &str) -> Result<PickupScheduled> {
    self.record("request_pickup", idempotency_key)?;
    Ok(PickupScheduled {
      pickup_token: Some("PK-1".to_string()),
      scheduled_date: None,
    })
  }

  async fn generate_label(&self, _shipment_id: &str, idempotency_key: &str) -> Result<LabelGenerated> {
    self.record("generate_label", idempotency_key)?;
    Ok(LabelGenerated {
      label_url: Some("https://labels.test/SH-1.pdf".to_string()),
    })
  }

  async fn generate_invoice(&self, carrier_order_ids: &[String]) -> Result<InvoiceGenerated> {
    self.record("generate_invoice", &carrier_order_ids.join(","))?;
    Ok(InvoiceGenerated {
      created: true,
      invoice_url: Some("https://invoices.test/1.pdf".to_string()),
    })
  }

  async fn track_awb(&self, awb_code: &str) -> Result<TrackingSnapshot> {
    self.record("track_awb", awb_code)?;
    Ok(self.tracking.lock().clone())
  }
}

// --- Application ---

pub struct TestApp {
  pub store: Arc<MemoryStore>,
  pub journal: Arc<MemoryJournal>,
  pub gateway: Arc<FakeGateway>,
  pub carrier: Arc<FakeCarrier>,
  pub state: AppState,
}

impl TestApp {
  pub fn new() -> Self {
    Self::with_policy("strict")
  }

  pub fn with_policy(policy: &str) -> Self {
    let store = Arc::new(MemoryStore::new());
    let journal = Arc::new(MemoryJournal::new());
    let repos = Repositories {
      orders: store.clone(),
      catalog: store.clone(),
      customers: store.clone(),
      content: store.clone(),
      shipments: journal.clone(),
    };
    let gateway = Arc::new(FakeGateway::default());
    let carrier = Arc::new(FakeCarrier::default());
    let state = AppState::new(Arc::new(test_config(policy)), repos, gateway.clone(), carrier.clone());
    Self {
      store,
      journal,
      gateway,
      carrier,
      state,
    }
  }

  /// A user with a profile row and the bearer header value for them.
  pub fn user(&self, role: Role) -> (Uuid, String) {
    let user_id = Uuid::new_v4();
    self.store.insert_profile(user_id, role, Some("Test User"));
    (user_id, bearer(user_id))
  }

  pub async fn product(&self, slug: &str, price_cents: i64, stock: i32) -> Product {
    self
      .store
      .create_product(&product_input(slug, price_cents, stock))
      .await
      .expect("product should be created")
  }

  /// A confirmed order for `quantity` units of `product`.
  pub async fn order(&self, user_id: Uuid, product: &Product, quantity: i32) -> Order {
    self
      .store
      .create_order(NewOrder {
        user_id,
        status: OrderStatus::Confirmed,
        total_amount_cents: product.price_cents * quantity as i64,
        currency: "INR".to_string(),
        shipping_address: address(),
        payment_gateway_order_id: None,
        payment_id: None,
        items: vec![NewOrderItem {
          product_id: product.id,
          product_name: product.name.clone(),
          size: None,
          quantity,
          unit_price_cents: product.price_cents,
        }],
        timeline_description: "Order placed and payment confirmed".to_string(),
      })
      .await
      .expect("order should be created")
  }

  /// Moves an order straight to `new_status`, bypassing the transition policy.
  pub async fn force_status(&self, order: &Order, new_status: OrderStatus) -> Order {
    self
      .store
      .apply_status_change(StatusChange {
        order_id: order.id,
        expected_status: order.status,
        new_status,
        description: format!("Order status changed to {}", new_status),
        location: None,
      })
      .await
      .expect("status change should apply")
  }
}

pub fn bearer(user_id: Uuid) -> String {
  let claims = TokenClaims {
    sub: user_id.to_string(),
    aud: "authenticated".to_string(),
    exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
  };
  let token = jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET.as_bytes()))
    .expect("token should encode");
  format!("Bearer {}", token)
}

pub fn product_input(slug: &str, price_cents: i64, stock: i32) -> ProductInput {
  ProductInput {
    name: format!("Product {}", slug),
    slug: slug.to_string(),
    description: None,
    category_id: None,
    price_cents,
    discount_price_cents: None,
    stock_quantity: stock,
    low_stock_threshold: 2,
    is_active: true,
  }
}

pub fn address() -> ShippingAddress {
  ShippingAddress {
    full_name: "Asha Rao".to_string(),
    phone: "9876543210".to_string(),
    line1: "12 MG Road".to_string(),
    line2: None,
    city: "Bengaluru".to_string(),
    state: "Karnataka".to_string(),
    postcode: "560001".to_string(),
    country: "India".to_string(),
  }
}

pub fn address_json() -> serde_json::Value {
  serde_json::to_value(address()).expect("address should serialize")
}
