// storefront/src/main.rs

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use boutique_storefront::config::{AppConfig, StoreBackend};
use boutique_storefront::db::memory::MemoryStore;
use boutique_storefront::db::Repositories;
use boutique_storefront::web::configure_app_routes;
use boutique_storefront::AppState;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing(json: bool) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE); // span close events carry durations
  if json {
    builder.json().init();
  } else {
    builder.init();
  }
}

async fn open_repositories(config: &AppConfig) -> anyhow::Result<Repositories> {
  match config.store_backend {
    StoreBackend::Memory => {
      tracing::warn!("Using the in-memory store; data is lost on restart.");
      Ok(Repositories::memory(Arc::new(MemoryStore::new())))
    }
    StoreBackend::Postgres => {
      let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL is not set")?;
      let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("Failed to connect to the database")?;
      tracing::info!("Successfully connected to the database.");

      if config.run_migrations {
        sqlx::migrate!("./migrations")
          .run(&pool)
          .await
          .context("Failed to run migrations")?;
        tracing::info!("Database migrations applied.");
      }
      Ok(Repositories::postgres(pool))
    }
  }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  let loaded = AppConfig::from_env();
  init_tracing(loaded.as_ref().map_or(false, |c| c.log_json));
  tracing::info!("Starting boutique storefront server...");

  let config = match loaded {
    Ok(config) => Arc::new(config),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(anyhow::anyhow!(e));
    }
  };
  let repos = open_repositories(&config).await.inspect_err(|e| {
    tracing::error!(error = %e, "Failed to open the store.");
  })?;
  let app_state = AppState::with_http_clients(config.clone(), repos).context("Failed to build application state")?;

  let server_address = config.bind_address();
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(web::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)
  .with_context(|| format!("Failed to bind {}", server_address))?
  .run()
  .await?;
  Ok(())
}
