// storefront/src/db/mod.rs

//! Storage ports. Handlers and services only see these traits; `postgres`
//! implements them with sqlx and `memory` keeps everything in process.

pub mod memory;
pub mod postgres;

use crate::errors::Result;
use crate::models::{
  Banner, BannerInput, Category, CategoryInput, CustomisationQuery, CustomisationQueryInput, DashboardStats,
  NewNotification, NewOrder, NewReview, Notification, NotificationFilter, Order, OrderFilter, OrderItem, Product,
  ProductFilter, ProductImage, ProductInput, ProductSize, Profile, ProfileUpdate, QueryFilter, QueryStatus, Review,
  Role, ShipmentPatch, SizeInput, StatusChange, TimelineEntry, WishlistItem,
};
use async_trait::async_trait;
use std::sync::Arc;
use stepflow::StepJournal;
use uuid::Uuid;

#[async_trait]
pub trait OrderRepository: Send + Sync {
  /// Inserts the order, its items and its first timeline row, decrementing
  /// stock for every item, all in one transaction.
  async fn create_order(&self, new_order: NewOrder) -> Result<Order>;

  async fn find_order(&self, order_id: Uuid) -> Result<Option<Order>>;

  async fn find_order_by_awb(&self, awb_code: &str) -> Result<Option<Order>>;

  async fn list_orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>>;

  async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>>;

  async fn order_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>>;

  /// Timeline rows, oldest first.
  async fn timeline(&self, order_id: Uuid) -> Result<Vec<TimelineEntry>>;

  /// Writes the status, stamps `shipped_at`/`delivered_at` and appends the
  /// timeline row in one transaction. Fails with `Conflict` if the order is
  /// no longer in `change.expected_status`.
  async fn apply_status_change(&self, change: StatusChange) -> Result<Order>;

  async fn save_shipment_details(&self, order_id: Uuid, patch: &ShipmentPatch) -> Result<Order>;
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
  async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>>;
  async fn find_product(&self, product_id: Uuid) -> Result<Option<Product>>;
  async fn find_product_by_slug(&self, slug: &str) -> Result<Option<Product>>;
  async fn products_by_ids(&self, product_ids: &[Uuid]) -> Result<Vec<Product>>;
  async fn product_images(&self, product_id: Uuid) -> Result<Vec<ProductImage>>;
  async fn product_sizes(&self, product_id: Uuid) -> Result<Vec<ProductSize>>;
  async fn create_product(&self, input: &ProductInput) -> Result<Product>;
  async fn update_product(&self, product_id: Uuid, input: &ProductInput) -> Result<Product>;
  async fn delete_product(&self, product_id: Uuid) -> Result<()>;
  async fn replace_images(&self, product_id: Uuid, urls: &[String]) -> Result<Vec<ProductImage>>;
  async fn replace_sizes(&self, product_id: Uuid, sizes: &[SizeInput]) -> Result<Vec<ProductSize>>;

  async fn list_categories(&self, include_inactive: bool) -> Result<Vec<Category>>;
  async fn create_category(&self, input: &CategoryInput) -> Result<Category>;
  async fn update_category(&self, category_id: Uuid, input: &CategoryInput) -> Result<Category>;
  async fn delete_category(&self, category_id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
  async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>>;
  async fn role_of(&self, user_id: Uuid) -> Result<Option<Role>>;
  async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<Profile>;

  async fn list_wishlist(&self, user_id: Uuid) -> Result<Vec<WishlistItem>>;
  /// Returns `false` when the product was already on the wishlist.
  async fn add_to_wishlist(&self, user_id: Uuid, product_id: Uuid) -> Result<bool>;
  async fn remove_from_wishlist(&self, user_id: Uuid, product_id: Uuid) -> Result<bool>;

  async fn list_product_reviews(&self, product_id: Uuid, approved_only: bool) -> Result<Vec<Review>>;
  async fn list_all_reviews(&self) -> Result<Vec<Review>>;
  async fn create_review(&self, review: NewReview) -> Result<Review>;
  async fn set_review_approval(&self, review_id: Uuid, approved: bool) -> Result<Review>;
  async fn delete_review(&self, review_id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait ContentRepository: Send + Sync {
  async fn list_banners(&self, include_inactive: bool) -> Result<Vec<Banner>>;
  async fn create_banner(&self, input: &BannerInput) -> Result<Banner>;
  async fn update_banner(&self, banner_id: Uuid, input: &BannerInput) -> Result<Banner>;
  async fn delete_banner(&self, banner_id: Uuid) -> Result<()>;

  async fn create_query(&self, user_id: Option<Uuid>, input: &CustomisationQueryInput) -> Result<CustomisationQuery>;
  async fn list_queries(&self, filter: &QueryFilter) -> Result<Vec<CustomisationQuery>>;
  async fn update_query_status(&self, query_id: Uuid, status: QueryStatus) -> Result<CustomisationQuery>;
  async fn delete_query(&self, query_id: Uuid) -> Result<()>;

  async fn create_notification(&self, notification: NewNotification) -> Result<Notification>;
  /// Newest first.
  async fn list_notifications(&self, filter: &NotificationFilter) -> Result<Vec<Notification>>;
  async fn mark_notification_read(&self, notification_id: Uuid) -> Result<Notification>;
  async fn mark_all_notifications_read(&self) -> Result<u64>;

  async fn dashboard_stats(&self) -> Result<DashboardStats>;
}

/// The storage handles shared through `AppState`.
#[derive(Clone)]
pub struct Repositories {
  pub orders: Arc<dyn OrderRepository>,
  pub catalog: Arc<dyn CatalogRepository>,
  pub customers: Arc<dyn CustomerRepository>,
  pub content: Arc<dyn ContentRepository>,
  /// Journal of shipment runs, keyed by order id.
  pub shipments: Arc<dyn StepJournal>,
}

impl Repositories {
  pub fn postgres(pool: sqlx::PgPool) -> Self {
    let store = Arc::new(postgres::PgStore::new(pool.clone()));
    Self {
      orders: store.clone(),
      catalog: store.clone(),
      customers: store.clone(),
      content: store,
      shipments: Arc::new(postgres::PgShipmentJournal::new(pool)),
    }
  }

  pub fn memory(store: Arc<memory::MemoryStore>) -> Self {
    Self {
      orders: store.clone(),
      catalog: store.clone(),
      customers: store.clone(),
      content: store,
      shipments: Arc::new(stepflow::MemoryJournal::new()),
    }
  }
}
