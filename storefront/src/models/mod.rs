// storefront/src/models/mod.rs

//! Data structures representing database entities and their inputs.

pub mod banner;
pub mod category;
pub mod customisation_query;
pub mod dashboard;
pub mod notification;
pub mod order;
pub mod order_item;
pub mod product;
pub mod profile;
pub mod review;
pub mod wishlist;

pub use banner::{Banner, BannerInput};
pub use category::{Category, CategoryInput};
pub use customisation_query::{CustomisationQuery, CustomisationQueryInput, QueryFilter, QueryStatus};
pub use dashboard::DashboardStats;
pub use notification::{NewNotification, Notification, NotificationFilter};
pub use order::{
  NewOrder, NewOrderItem, Order, OrderDetail, OrderFilter, OrderStatus, ShipmentDetails, ShipmentPatch, ShippingAddress,
  StatusChange, TimelineEntry,
};
pub use order_item::OrderItem;
pub use product::{Product, ProductDetail, ProductFilter, ProductImage, ProductInput, ProductSize, SizeInput};
pub use profile::{Profile, ProfileUpdate, Role};
pub use review::{NewReview, Review, ReviewInput};
pub use wishlist::WishlistItem;
