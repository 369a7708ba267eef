// storefront/src/lib.rs

//! Boutique storefront backend: catalog, checkout, order lifecycle and
//! carrier shipping behind an actix-web JSON API.

pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod web;

pub use crate::config::AppConfig;
pub use crate::errors::{AppError, Result};
pub use crate::state::AppState;
