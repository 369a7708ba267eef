// storefront/src/config.rs

use crate::errors::{AppError, Result};
use crate::services::order_status::TransitionPolicy;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
  Postgres,
  /// Process-local store, for demos and tests. Nothing survives a restart.
  Memory,
}

impl FromStr for StoreBackend {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "postgres" | "pg" => Ok(StoreBackend::Postgres),
      "memory" => Ok(StoreBackend::Memory),
      other => Err(AppError::Config(format!("Invalid STORE_BACKEND '{}'", other))),
    }
  }
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
  pub jwt_secret: String,
  pub jwt_audience: String,
}

#[derive(Debug, Clone)]
pub struct PaymentSettings {
  pub api_base: String,
  pub key_id: String,
  pub key_secret: String,
  pub currency: String,
}

#[derive(Debug, Clone)]
pub struct CarrierSettings {
  pub api_base: String,
  pub api_token: String,
  pub webhook_secret: String,
  pub timeout_secs: u64,
  /// Warehouse postcode used as the pickup location for quotes and shipments.
  pub pickup_postcode: String,
  pub pickup_location: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub store_backend: StoreBackend,
  pub database_url: Option<String>,
  pub run_migrations: bool,
  pub auth: AuthSettings,
  pub payment: PaymentSettings,
  pub carrier: CarrierSettings,
  pub order_status_policy: TransitionPolicy,
  pub log_json: bool,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    let config = Self::from_lookup(|name| env::var(name).ok())?;
    tracing::info!(
      store_backend = ?config.store_backend,
      policy = ?config.order_status_policy,
      "Application configuration loaded successfully."
    );
    Ok(config)
  }

  /// Builds the configuration from any variable source.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_env = |var_name: &str| {
      lookup(var_name)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", var_name)))
    };
    let parse_bool = |var_name: &str, default: bool| -> Result<bool> {
      match get_env(var_name) {
        Ok(raw) => raw
          .parse::<bool>()
          .map_err(|e| AppError::Config(format!("Invalid {} value: {}", var_name, e))),
        Err(_) => Ok(default),
      }
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;

    let store_backend = match get_env("STORE_BACKEND") {
      Ok(raw) => raw.parse::<StoreBackend>()?,
      Err(_) => StoreBackend::Postgres,
    };
    let database_url = match store_backend {
      StoreBackend::Postgres => Some(get_env("DATABASE_URL")?),
      StoreBackend::Memory => get_env("DATABASE_URL").ok(),
    };
    let run_migrations = parse_bool("RUN_MIGRATIONS", false)?;

    let auth = AuthSettings {
      jwt_secret: get_env("AUTH_JWT_SECRET")?,
      jwt_audience: get_env("AUTH_JWT_AUDIENCE").unwrap_or_else(|_| "authenticated".to_string()),
    };

    let payment = PaymentSettings {
      api_base: get_env("PAYMENT_API_BASE")?,
      key_id: get_env("PAYMENT_KEY_ID")?,
      key_secret: get_env("PAYMENT_KEY_SECRET")?,
      currency: get_env("PAYMENT_CURRENCY").unwrap_or_else(|_| "INR".to_string()),
    };

    let carrier = CarrierSettings {
      api_base: get_env("CARRIER_API_BASE")?,
      api_token: get_env("CARRIER_API_TOKEN")?,
      webhook_secret: get_env("CARRIER_WEBHOOK_SECRET")?,
      timeout_secs: get_env("CARRIER_TIMEOUT_SECS")
        .unwrap_or_else(|_| "15".to_string())
        .parse::<u64>()
        .map_err(|e| AppError::Config(format!("Invalid CARRIER_TIMEOUT_SECS: {}", e)))?,
      pickup_postcode: get_env("CARRIER_PICKUP_POSTCODE")?,
      pickup_location: get_env("CARRIER_PICKUP_LOCATION").unwrap_or_else(|_| "Primary".to_string()),
    };

    let order_status_policy = match get_env("ORDER_STATUS_POLICY") {
      Ok(raw) => raw.parse::<TransitionPolicy>()?,
      Err(_) => TransitionPolicy::Strict,
    };

    let log_json = get_env("LOG_FORMAT").map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false);

    Ok(Self {
      server_host,
      server_port,
      store_backend,
      database_url,
      run_migrations,
      auth,
      payment,
      carrier,
      order_status_policy,
      log_json,
    })
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}
