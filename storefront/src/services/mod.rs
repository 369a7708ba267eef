// storefront/src/services/mod.rs

//! Domain services and the clients for the payment gateway and the carrier.

pub mod access;
pub mod carrier;
pub mod order_status;
pub mod payment_gateway;
pub mod pricing;
pub mod shipping;
pub mod signature;
