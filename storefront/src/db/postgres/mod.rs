// storefront/src/db/postgres/mod.rs

//! sqlx-backed repositories. Queries are runtime-checked (`sqlx::query_as`
//! with explicit column lists) so the crate builds without a live database.

mod catalog;
mod content;
mod customers;
mod journal;
mod orders;

pub use journal::PgShipmentJournal;

use crate::errors::AppError;
use sqlx::PgPool;

#[derive(Debug, Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

/// Maps a unique-constraint violation to `conflict`, anything else to a database error.
pub(crate) fn on_unique_violation(err: sqlx::Error, conflict: impl FnOnce() -> AppError) -> AppError {
  match err.as_database_error() {
    Some(db_err) if db_err.is_unique_violation() => conflict(),
    _ => AppError::Database(err),
  }
}

pub(crate) fn on_foreign_key_violation(err: sqlx::Error, violation: impl FnOnce() -> AppError) -> AppError {
  match err.as_database_error() {
    Some(db_err) if db_err.is_foreign_key_violation() => violation(),
    _ => AppError::Database(err),
  }
}

pub(crate) fn not_found(what: &str, id: uuid::Uuid) -> AppError {
  AppError::NotFound(format!("{} {} not found", what, id))
}
