// storefront/src/web/handlers/mod.rs

pub mod catalog_handlers;
pub mod checkout_handlers;
pub mod content_handlers;
pub mod customer_handlers;
pub mod order_handlers;
pub mod shipping_handlers;
