// storefront/src/db/memory.rs

//! Process-local implementation of every repository trait.
//!
//! One mutex guards the whole data set, so every trait method is atomic the
//! same way a single database transaction would be.

use crate::db::{CatalogRepository, ContentRepository, CustomerRepository, OrderRepository};
use crate::errors::{AppError, Result};
use crate::models::{
  Banner, BannerInput, Category, CategoryInput, CustomisationQuery, CustomisationQueryInput, DashboardStats,
  NewNotification, NewOrder, NewReview, Notification, NotificationFilter, Order, OrderFilter, OrderItem, OrderStatus,
  Product, ProductFilter, ProductImage, ProductInput, ProductSize, Profile, ProfileUpdate, QueryFilter, QueryStatus,
  Review, Role, ShipmentDetails, ShipmentPatch, SizeInput, StatusChange, TimelineEntry, WishlistItem,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct WishlistRow {
  id: Uuid,
  user_id: Uuid,
  product_id: Uuid,
  created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MemoryData {
  products: Vec<Product>,
  images: Vec<ProductImage>,
  sizes: Vec<ProductSize>,
  categories: Vec<Category>,
  orders: Vec<Order>,
  items: Vec<OrderItem>,
  timeline: Vec<TimelineEntry>,
  profiles: HashMap<Uuid, Profile>,
  wishlist: Vec<WishlistRow>,
  reviews: Vec<Review>,
  banners: Vec<Banner>,
  queries: Vec<CustomisationQuery>,
  notifications: Vec<Notification>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
  data: Mutex<MemoryData>,
}

const DEFAULT_ORDER_PAGE: i64 = 50;
const MAX_ORDER_PAGE: i64 = 200;

fn not_found(what: &str, id: Uuid) -> AppError {
  AppError::NotFound(format!("{} {} not found", what, id))
}

fn page<T: Clone>(rows: impl Iterator<Item = T>, limit: i64, offset: i64) -> Vec<T> {
  rows.skip(offset as usize).take(limit as usize).collect()
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates the profile the auth backend would create on signup.
  pub fn insert_profile(&self, user_id: Uuid, role: Role, full_name: Option<&str>) -> Profile {
    let profile = Profile {
      id: user_id,
      full_name: full_name.map(str::to_string),
      email: None,
      phone: None,
      role,
      address_line1: None,
      address_line2: None,
      city: None,
      state: None,
      postcode: None,
      country: None,
      created_at: Utc::now(),
    };
    self.data.lock().profiles.insert(user_id, profile.clone());
    profile
  }

  pub fn wishlist_len(&self, user_id: Uuid) -> usize {
    self.data.lock().wishlist.iter().filter(|row| row.user_id == user_id).count()
  }
}

fn build_product(id: Uuid, input: &ProductInput, created_at: DateTime<Utc>) -> Product {
  Product {
    id,
    name: input.name.clone(),
    slug: input.slug.clone(),
    description: input.description.clone(),
    category_id: input.category_id,
    price_cents: input.price_cents,
    discount_price_cents: input.discount_price_cents,
    stock_quantity: input.stock_quantity,
    low_stock_threshold: input.low_stock_threshold,
    is_active: input.is_active,
    created_at,
    updated_at: Utc::now(),
  }
}

fn build_category(id: Uuid, input: &CategoryInput, created_at: DateTime<Utc>) -> Category {
  Category {
    id,
    name: input.name.clone(),
    slug: input.slug.clone(),
    description: input.description.clone(),
    image_url: input.image_url.clone(),
    is_active: input.is_active,
    created_at,
  }
}

fn build_banner(id: Uuid, input: &BannerInput, created_at: DateTime<Utc>) -> Banner {
  Banner {
    id,
    title: input.title.clone(),
    subtitle: input.subtitle.clone(),
    image_url: input.image_url.clone(),
    link_url: input.link_url.clone(),
    position: input.position,
    is_active: input.is_active,
    created_at,
  }
}

#[async_trait]
impl OrderRepository for MemoryStore {
  async fn create_order(&self, new_order: NewOrder) -> Result<Order> {
    let mut data = self.data.lock();

    if let Some(gateway_id) = &new_order.payment_gateway_order_id {
      if data
        .orders
        .iter()
        .any(|o| o.payment_gateway_order_id.as_deref() == Some(gateway_id.as_str()))
      {
        return Err(AppError::Conflict("An order was already recorded for this payment".to_string()));
      }
    }

    // Several lines may draw on the same product or size stock.
    let mut per_product: HashMap<Uuid, i32> = HashMap::new();
    let mut per_size: HashMap<(Uuid, &str), i32> = HashMap::new();
    for item in &new_order.items {
      *per_product.entry(item.product_id).or_default() += item.quantity;
      if let Some(size) = &item.size {
        *per_size.entry((item.product_id, size.as_str())).or_default() += item.quantity;
      }
    }

    // Check everything before touching stock so a failure leaves nothing behind.
    for (product_id, requested) in &per_product {
      let product = data
        .products
        .iter()
        .find(|p| p.id == *product_id)
        .ok_or_else(|| not_found("Product", *product_id))?;
      if product.stock_quantity < *requested {
        return Err(AppError::Validation(format!("Insufficient stock for {}", product.name)));
      }
    }
    for ((product_id, size), requested) in &per_size {
      let row = data
        .sizes
        .iter()
        .find(|s| s.product_id == *product_id && s.size == *size);
      if let Some(row) = row.filter(|r| r.stock_quantity < *requested) {
        let name = data
          .products
          .iter()
          .find(|p| p.id == row.product_id)
          .map(|p| p.name.as_str())
          .unwrap_or_default();
        return Err(AppError::Validation(format!("Insufficient stock for {} in size {}", name, size)));
      }
    }

    let now = Utc::now();
    for item in &new_order.items {
      if let Some(product) = data.products.iter_mut().find(|p| p.id == item.product_id) {
        product.stock_quantity -= item.quantity;
        product.updated_at = now;
      }
      if let Some(size) = &item.size {
        if let Some(row) = data
          .sizes
          .iter_mut()
          .find(|s| s.product_id == item.product_id && &s.size == size)
        {
          row.stock_quantity -= item.quantity;
        }
      }
    }

    let order = Order {
      id: Uuid::new_v4(),
      user_id: new_order.user_id,
      status: new_order.status,
      total_amount_cents: new_order.total_amount_cents,
      currency: new_order.currency,
      shipping_address: new_order.shipping_address,
      payment_gateway_order_id: new_order.payment_gateway_order_id,
      payment_id: new_order.payment_id,
      shipment: ShipmentDetails::default(),
      created_at: now,
      updated_at: now,
      shipped_at: None,
      delivered_at: None,
    };
    for item in new_order.items {
      data.items.push(OrderItem {
        id: Uuid::new_v4(),
        order_id: order.id,
        product_id: item.product_id,
        product_name: item.product_name,
        size: item.size,
        quantity: item.quantity,
        unit_price_cents: item.unit_price_cents,
      });
    }
    data.timeline.push(TimelineEntry {
      id: Uuid::new_v4(),
      order_id: order.id,
      status: order.status,
      description: new_order.timeline_description,
      location: None,
      created_at: now,
    });
    data.orders.push(order.clone());
    Ok(order)
  }

  async fn find_order(&self, order_id: Uuid) -> Result<Option<Order>> {
    Ok(self.data.lock().orders.iter().find(|o| o.id == order_id).cloned())
  }

  async fn find_order_by_awb(&self, awb_code: &str) -> Result<Option<Order>> {
    Ok(
      self
        .data
        .lock()
        .orders
        .iter()
        .find(|o| o.shipment.awb_code.as_deref() == Some(awb_code))
        .cloned(),
    )
  }

  async fn list_orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>> {
    let data = self.data.lock();
    Ok(data.orders.iter().rev().filter(|o| o.user_id == user_id).cloned().collect())
  }

  async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
    let limit = filter.limit.unwrap_or(DEFAULT_ORDER_PAGE).clamp(1, MAX_ORDER_PAGE);
    let offset = filter.offset.unwrap_or(0).max(0);
    let data = self.data.lock();
    let rows = data
      .orders
      .iter()
      .rev()
      .filter(|o| filter.status.map_or(true, |s| o.status == s))
      .cloned();
    Ok(page(rows, limit, offset))
  }

  async fn order_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>> {
    let data = self.data.lock();
    Ok(data.items.iter().filter(|i| i.order_id == order_id).cloned().collect())
  }

  async fn timeline(&self, order_id: Uuid) -> Result<Vec<TimelineEntry>> {
    let data = self.data.lock();
    Ok(data.timeline.iter().filter(|t| t.order_id == order_id).cloned().collect())
  }

  async fn apply_status_change(&self, change: StatusChange) -> Result<Order> {
    let mut data = self.data.lock();
    let order = data
      .orders
      .iter_mut()
      .find(|o| o.id == change.order_id)
      .ok_or_else(|| not_found("Order", change.order_id))?;
    if order.status != change.expected_status {
      return Err(AppError::Conflict(format!(
        "Order {} changed status concurrently (now {})",
        order.id, order.status
      )));
    }
    let now = Utc::now();
    order.status = change.new_status;
    order.updated_at = now;
    match change.new_status {
      OrderStatus::Shipped => order.shipped_at = Some(now),
      OrderStatus::Delivered => order.delivered_at = Some(now),
      _ => {}
    }
    let updated = order.clone();
    data.timeline.push(TimelineEntry {
      id: Uuid::new_v4(),
      order_id: change.order_id,
      status: change.new_status,
      description: change.description,
      location: change.location,
      created_at: now,
    });
    Ok(updated)
  }

  async fn save_shipment_details(&self, order_id: Uuid, patch: &ShipmentPatch) -> Result<Order> {
    let mut data = self.data.lock();
    let order = data
      .orders
      .iter_mut()
      .find(|o| o.id == order_id)
      .ok_or_else(|| not_found("Order", order_id))?;
    patch.apply_to(&mut order.shipment);
    order.updated_at = Utc::now();
    Ok(order.clone())
  }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
  async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
    let (limit, offset) = filter.page();
    let data = self.data.lock();
    let category_id = match &filter.category {
      Some(slug) => match data.categories.iter().find(|c| &c.slug == slug) {
        Some(category) => Some(category.id),
        None => return Ok(Vec::new()),
      },
      None => None,
    };
    let needle = filter.search.as_ref().map(|s| s.to_lowercase());
    let mut rows: Vec<Product> = data
      .products
      .iter()
      .filter(|p| filter.include_inactive || p.is_active)
      .filter(|p| category_id.map_or(true, |id| p.category_id == Some(id)))
      .filter(|p| needle.as_ref().map_or(true, |n| p.name.to_lowercase().contains(n)))
      .cloned()
      .collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(page(rows.into_iter(), limit, offset))
  }

  async fn find_product(&self, product_id: Uuid) -> Result<Option<Product>> {
    Ok(self.data.lock().products.iter().find(|p| p.id == product_id).cloned())
  }

  async fn find_product_by_slug(&self, slug: &str) -> Result<Option<Product>> {
    Ok(self.data.lock().products.iter().find(|p| p.slug == slug).cloned())
  }

  async fn products_by_ids(&self, product_ids: &[Uuid]) -> Result<Vec<Product>> {
    let data = self.data.lock();
    Ok(data.products.iter().filter(|p| product_ids.contains(&p.id)).cloned().collect())
  }

  async fn product_images(&self, product_id: Uuid) -> Result<Vec<ProductImage>> {
    let data = self.data.lock();
    let mut images: Vec<ProductImage> = data.images.iter().filter(|i| i.product_id == product_id).cloned().collect();
    images.sort_by_key(|i| i.position);
    Ok(images)
  }

  async fn product_sizes(&self, product_id: Uuid) -> Result<Vec<ProductSize>> {
    let data = self.data.lock();
    Ok(data.sizes.iter().filter(|s| s.product_id == product_id).cloned().collect())
  }

  async fn create_product(&self, input: &ProductInput) -> Result<Product> {
    let mut data = self.data.lock();
    if data.products.iter().any(|p| p.slug == input.slug) {
      return Err(AppError::Conflict(format!("A product with slug '{}' already exists", input.slug)));
    }
    let product = build_product(Uuid::new_v4(), input, Utc::now());
    data.products.push(product.clone());
    Ok(product)
  }

  async fn update_product(&self, product_id: Uuid, input: &ProductInput) -> Result<Product> {
    let mut data = self.data.lock();
    if data.products.iter().any(|p| p.slug == input.slug && p.id != product_id) {
      return Err(AppError::Conflict(format!("A product with slug '{}' already exists", input.slug)));
    }
    let product = data
      .products
      .iter_mut()
      .find(|p| p.id == product_id)
      .ok_or_else(|| not_found("Product", product_id))?;
    *product = build_product(product_id, input, product.created_at);
    Ok(product.clone())
  }

  async fn delete_product(&self, product_id: Uuid) -> Result<()> {
    let mut data = self.data.lock();
    if !data.products.iter().any(|p| p.id == product_id) {
      return Err(not_found("Product", product_id));
    }
    if data.items.iter().any(|i| i.product_id == product_id) {
      return Err(AppError::Validation(
        "Product is referenced by orders; deactivate it instead".to_string(),
      ));
    }
    data.products.retain(|p| p.id != product_id);
    data.images.retain(|i| i.product_id != product_id);
    data.sizes.retain(|s| s.product_id != product_id);
    data.wishlist.retain(|w| w.product_id != product_id);
    data.reviews.retain(|r| r.product_id != product_id);
    Ok(())
  }

  async fn replace_images(&self, product_id: Uuid, urls: &[String]) -> Result<Vec<ProductImage>> {
    let mut data = self.data.lock();
    if !data.products.iter().any(|p| p.id == product_id) {
      return Err(not_found("Product", product_id));
    }
    data.images.retain(|i| i.product_id != product_id);
    let images: Vec<ProductImage> = urls
      .iter()
      .enumerate()
      .map(|(idx, url)| ProductImage {
        id: Uuid::new_v4(),
        product_id,
        url: url.clone(),
        position: idx as i32,
      })
      .collect();
    data.images.extend(images.iter().cloned());
    Ok(images)
  }

  async fn replace_sizes(&self, product_id: Uuid, sizes: &[SizeInput]) -> Result<Vec<ProductSize>> {
    let mut data = self.data.lock();
    if !data.products.iter().any(|p| p.id == product_id) {
      return Err(not_found("Product", product_id));
    }
    data.sizes.retain(|s| s.product_id != product_id);
    let rows: Vec<ProductSize> = sizes
      .iter()
      .map(|s| ProductSize {
        id: Uuid::new_v4(),
        product_id,
        size: s.size.clone(),
        stock_quantity: s.stock_quantity,
      })
      .collect();
    data.sizes.extend(rows.iter().cloned());
    Ok(rows)
  }

  async fn list_categories(&self, include_inactive: bool) -> Result<Vec<Category>> {
    let data = self.data.lock();
    let mut rows: Vec<Category> = data
      .categories
      .iter()
      .filter(|c| include_inactive || c.is_active)
      .cloned()
      .collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(rows)
  }

  async fn create_category(&self, input: &CategoryInput) -> Result<Category> {
    let mut data = self.data.lock();
    if data.categories.iter().any(|c| c.slug == input.slug) {
      return Err(AppError::Conflict(format!("A category with slug '{}' already exists", input.slug)));
    }
    let category = build_category(Uuid::new_v4(), input, Utc::now());
    data.categories.push(category.clone());
    Ok(category)
  }

  async fn update_category(&self, category_id: Uuid, input: &CategoryInput) -> Result<Category> {
    let mut data = self.data.lock();
    if data.categories.iter().any(|c| c.slug == input.slug && c.id != category_id) {
      return Err(AppError::Conflict(format!("A category with slug '{}' already exists", input.slug)));
    }
    let category = data
      .categories
      .iter_mut()
      .find(|c| c.id == category_id)
      .ok_or_else(|| not_found("Category", category_id))?;
    *category = build_category(category_id, input, category.created_at);
    Ok(category.clone())
  }

  async fn delete_category(&self, category_id: Uuid) -> Result<()> {
    let mut data = self.data.lock();
    let before = data.categories.len();
    data.categories.retain(|c| c.id != category_id);
    if data.categories.len() == before {
      return Err(not_found("Category", category_id));
    }
    for product in data.products.iter_mut().filter(|p| p.category_id == Some(category_id)) {
      product.category_id = None;
    }
    Ok(())
  }
}

#[async_trait]
impl CustomerRepository for MemoryStore {
  async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
    Ok(self.data.lock().profiles.get(&user_id).cloned())
  }

  async fn role_of(&self, user_id: Uuid) -> Result<Option<Role>> {
    Ok(self.data.lock().profiles.get(&user_id).map(|p| p.role))
  }

  async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<Profile> {
    let mut data = self.data.lock();
    let profile = data.profiles.get_mut(&user_id).ok_or_else(|| not_found("Profile", user_id))?;
    update.apply_to(profile);
    Ok(profile.clone())
  }

  async fn list_wishlist(&self, user_id: Uuid) -> Result<Vec<WishlistItem>> {
    let data = self.data.lock();
    let items = data
      .wishlist
      .iter()
      .rev()
      .filter(|row| row.user_id == user_id)
      .filter_map(|row| {
        let product = data.products.iter().find(|p| p.id == row.product_id)?;
        let image_url = data
          .images
          .iter()
          .filter(|i| i.product_id == row.product_id)
          .min_by_key(|i| i.position)
          .map(|i| i.url.clone());
        Some(WishlistItem {
          id: row.id,
          product_id: product.id,
          product_name: product.name.clone(),
          product_slug: product.slug.clone(),
          price_cents: product.price_cents,
          discount_price_cents: product.discount_price_cents,
          image_url,
          created_at: row.created_at,
        })
      })
      .collect();
    Ok(items)
  }

  async fn add_to_wishlist(&self, user_id: Uuid, product_id: Uuid) -> Result<bool> {
    let mut data = self.data.lock();
    if data
      .wishlist
      .iter()
      .any(|row| row.user_id == user_id && row.product_id == product_id)
    {
      return Ok(false);
    }
    data.wishlist.push(WishlistRow {
      id: Uuid::new_v4(),
      user_id,
      product_id,
      created_at: Utc::now(),
    });
    Ok(true)
  }

  async fn remove_from_wishlist(&self, user_id: Uuid, product_id: Uuid) -> Result<bool> {
    let mut data = self.data.lock();
    let before = data.wishlist.len();
    data
      .wishlist
      .retain(|row| !(row.user_id == user_id && row.product_id == product_id));
    Ok(data.wishlist.len() != before)
  }

  async fn list_product_reviews(&self, product_id: Uuid, approved_only: bool) -> Result<Vec<Review>> {
    let data = self.data.lock();
    Ok(
      data
        .reviews
        .iter()
        .rev()
        .filter(|r| r.product_id == product_id && (!approved_only || r.is_approved))
        .cloned()
        .collect(),
    )
  }

  async fn list_all_reviews(&self) -> Result<Vec<Review>> {
    Ok(self.data.lock().reviews.iter().rev().cloned().collect())
  }

  async fn create_review(&self, review: NewReview) -> Result<Review> {
    let mut data = self.data.lock();
    if data
      .reviews
      .iter()
      .any(|r| r.user_id == review.user_id && r.product_id == review.product_id)
    {
      return Err(AppError::Validation("You have already reviewed this product".to_string()));
    }
    let created = Review {
      id: Uuid::new_v4(),
      product_id: review.product_id,
      user_id: review.user_id,
      rating: review.rating,
      title: review.title,
      comment: review.comment,
      is_approved: false,
      created_at: Utc::now(),
    };
    data.reviews.push(created.clone());
    Ok(created)
  }

  async fn set_review_approval(&self, review_id: Uuid, approved: bool) -> Result<Review> {
    let mut data = self.data.lock();
    let review = data
      .reviews
      .iter_mut()
      .find(|r| r.id == review_id)
      .ok_or_else(|| not_found("Review", review_id))?;
    review.is_approved = approved;
    Ok(review.clone())
  }

  async fn delete_review(&self, review_id: Uuid) -> Result<()> {
    let mut data = self.data.lock();
    let before = data.reviews.len();
    data.reviews.retain(|r| r.id != review_id);
    if data.reviews.len() == before {
      return Err(not_found("Review", review_id));
    }
    Ok(())
  }
}

#[async_trait]
impl ContentRepository for MemoryStore {
  async fn list_banners(&self, include_inactive: bool) -> Result<Vec<Banner>> {
    let data = self.data.lock();
    let mut rows: Vec<Banner> = data
      .banners
      .iter()
      .filter(|b| include_inactive || b.is_active)
      .cloned()
      .collect();
    rows.sort_by_key(|b| b.position);
    Ok(rows)
  }

  async fn create_banner(&self, input: &BannerInput) -> Result<Banner> {
    let banner = build_banner(Uuid::new_v4(), input, Utc::now());
    self.data.lock().banners.push(banner.clone());
    Ok(banner)
  }

  async fn update_banner(&self, banner_id: Uuid, input: &BannerInput) -> Result<Banner> {
    let mut data = self.data.lock();
    let banner = data
      .banners
      .iter_mut()
      .find(|b| b.id == banner_id)
      .ok_or_else(|| not_found("Banner", banner_id))?;
    *banner = build_banner(banner_id, input, banner.created_at);
    Ok(banner.clone())
  }

  async fn delete_banner(&self, banner_id: Uuid) -> Result<()> {
    let mut data = self.data.lock();
    let before = data.banners.len();
    data.banners.retain(|b| b.id != banner_id);
    if data.banners.len() == before {
      return Err(not_found("Banner", banner_id));
    }
    Ok(())
  }

  async fn create_query(&self, user_id: Option<Uuid>, input: &CustomisationQueryInput) -> Result<CustomisationQuery> {
    let query = CustomisationQuery {
      id: Uuid::new_v4(),
      user_id,
      name: input.name.clone(),
      email: input.email.clone(),
      phone: input.phone.clone(),
      product_id: input.product_id,
      message: input.message.clone(),
      status: QueryStatus::New,
      created_at: Utc::now(),
    };
    self.data.lock().queries.push(query.clone());
    Ok(query)
  }

  async fn list_queries(&self, filter: &QueryFilter) -> Result<Vec<CustomisationQuery>> {
    let data = self.data.lock();
    Ok(
      data
        .queries
        .iter()
        .rev()
        .filter(|q| filter.status.map_or(true, |s| q.status == s))
        .cloned()
        .collect(),
    )
  }

  async fn update_query_status(&self, query_id: Uuid, status: QueryStatus) -> Result<CustomisationQuery> {
    let mut data = self.data.lock();
    let query = data
      .queries
      .iter_mut()
      .find(|q| q.id == query_id)
      .ok_or_else(|| not_found("Customisation query", query_id))?;
    query.status = status;
    Ok(query.clone())
  }

  async fn delete_query(&self, query_id: Uuid) -> Result<()> {
    let mut data = self.data.lock();
    let before = data.queries.len();
    data.queries.retain(|q| q.id != query_id);
    if data.queries.len() == before {
      return Err(not_found("Customisation query", query_id));
    }
    Ok(())
  }

  async fn create_notification(&self, notification: NewNotification) -> Result<Notification> {
    let created = Notification {
      id: Uuid::new_v4(),
      kind: notification.kind,
      title: notification.title,
      message: notification.message,
      order_id: notification.order_id,
      is_read: false,
      created_at: Utc::now(),
    };
    self.data.lock().notifications.push(created.clone());
    Ok(created)
  }

  async fn list_notifications(&self, filter: &NotificationFilter) -> Result<Vec<Notification>> {
    let data = self.data.lock();
    Ok(
      data
        .notifications
        .iter()
        .rev()
        .filter(|n| !filter.unread_only || !n.is_read)
        .cloned()
        .collect(),
    )
  }

  async fn mark_notification_read(&self, notification_id: Uuid) -> Result<Notification> {
    let mut data = self.data.lock();
    let notification = data
      .notifications
      .iter_mut()
      .find(|n| n.id == notification_id)
      .ok_or_else(|| not_found("Notification", notification_id))?;
    notification.is_read = true;
    Ok(notification.clone())
  }

  async fn mark_all_notifications_read(&self) -> Result<u64> {
    let mut data = self.data.lock();
    let mut updated = 0;
    for notification in data.notifications.iter_mut().filter(|n| !n.is_read) {
      notification.is_read = true;
      updated += 1;
    }
    Ok(updated)
  }

  async fn dashboard_stats(&self) -> Result<DashboardStats> {
    let data = self.data.lock();
    Ok(DashboardStats {
      total_orders: data.orders.len() as i64,
      pending_orders: data.orders.iter().filter(|o| o.status.is_open()).count() as i64,
      revenue_cents: data
        .orders
        .iter()
        .filter(|o| o.status.counts_as_revenue())
        .map(|o| o.total_amount_cents)
        .sum(),
      low_stock: data.products.iter().filter(|p| p.is_low_stock()).count() as i64,
      unread_notifications: data.notifications.iter().filter(|n| !n.is_read).count() as i64,
      total_customers: data.profiles.values().filter(|p| p.role == Role::Customer).count() as i64,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{NewOrderItem, ShippingAddress};

  fn address() -> ShippingAddress {
    ShippingAddress {
      full_name: "Asha Rao".into(),
      phone: "9876543210".into(),
      line1: "12 MG Road".into(),
      line2: None,
      city: "Bengaluru".into(),
      state: "KA".into(),
      postcode: "560001".into(),
      country: "IN".into(),
    }
  }

  fn product_input(slug: &str, stock: i32) -> ProductInput {
    ProductInput {
      name: slug.replace('-', " "),
      slug: slug.to_string(),
      description: None,
      category_id: None,
      price_cents: 2499,
      discount_price_cents: None,
      stock_quantity: stock,
      low_stock_threshold: 1,
      is_active: true,
    }
  }

  fn new_order(user_id: Uuid, product: &Product, quantity: i32) -> NewOrder {
    NewOrder {
      user_id,
      status: OrderStatus::Confirmed,
      total_amount_cents: product.price_cents * i64::from(quantity),
      currency: "INR".into(),
      shipping_address: address(),
      payment_gateway_order_id: Some(format!("gw_{}", Uuid::new_v4().simple())),
      payment_id: Some("pay_1".into()),
      items: vec![NewOrderItem {
        product_id: product.id,
        product_name: product.name.clone(),
        size: None,
        quantity,
        unit_price_cents: product.price_cents,
      }],
      timeline_description: "Order placed and payment confirmed".into(),
    }
  }

  #[tokio::test]
  async fn create_order_decrements_stock_and_starts_timeline() {
    let store = MemoryStore::new();
    let product = store.create_product(&product_input("silk-saree", 3)).await.unwrap();

    let order = store.create_order(new_order(Uuid::new_v4(), &product, 2)).await.unwrap();

    let stock = store.find_product(product.id).await.unwrap().unwrap().stock_quantity;
    assert_eq!(stock, 1);
    let timeline = store.timeline(order.id).await.unwrap();
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0].status, OrderStatus::Confirmed);
    assert_eq!(store.order_items(order.id).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn insufficient_stock_leaves_nothing_behind() {
    let store = MemoryStore::new();
    let product = store.create_product(&product_input("cotton-dupatta", 1)).await.unwrap();

    let err = store.create_order(new_order(Uuid::new_v4(), &product, 2)).await.unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(store.find_product(product.id).await.unwrap().unwrap().stock_quantity, 1);
    assert!(store.list_orders(&OrderFilter::default()).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn repeated_lines_are_checked_against_total_stock() {
    let store = MemoryStore::new();
    let product = store.create_product(&product_input("ikat-kurta", 3)).await.unwrap();
    let mut order = new_order(Uuid::new_v4(), &product, 2);
    order.items.push(order.items[0].clone());

    let err = store.create_order(order).await.unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(store.find_product(product.id).await.unwrap().unwrap().stock_quantity, 3);
    assert!(store.list_orders(&OrderFilter::default()).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn repeated_sizes_are_checked_against_size_stock() {
    let store = MemoryStore::new();
    let product = store.create_product(&product_input("chikankari-kurti", 10)).await.unwrap();
    store
      .replace_sizes(
        product.id,
        &[SizeInput {
          size: "M".into(),
          stock_quantity: 3,
        }],
      )
      .await
      .unwrap();
    let mut order = new_order(Uuid::new_v4(), &product, 2);
    order.items[0].size = Some("M".into());
    order.items.push(order.items[0].clone());

    let err = store.create_order(order).await.unwrap_err();

    assert!(matches!(err, AppError::Validation(msg) if msg.contains("in size M")));
    assert_eq!(store.find_product(product.id).await.unwrap().unwrap().stock_quantity, 10);
  }

  #[tokio::test]
  async fn stale_expected_status_is_a_conflict() {
    let store = MemoryStore::new();
    let product = store.create_product(&product_input("wrap-skirt", 5)).await.unwrap();
    let order = store.create_order(new_order(Uuid::new_v4(), &product, 1)).await.unwrap();

    let err = store
      .apply_status_change(StatusChange {
        order_id: order.id,
        expected_status: OrderStatus::Pending,
        new_status: OrderStatus::Processing,
        description: "x".into(),
        location: None,
      })
      .await
      .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(store.timeline(order.id).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn product_referenced_by_orders_cannot_be_deleted() {
    let store = MemoryStore::new();
    let product = store.create_product(&product_input("block-print-top", 5)).await.unwrap();
    store.create_order(new_order(Uuid::new_v4(), &product, 1)).await.unwrap();

    let err = store.delete_product(product.id).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
  }

  #[tokio::test]
  async fn duplicate_review_is_rejected() {
    let store = MemoryStore::new();
    let user_id = Uuid::new_v4();
    let product_id = Uuid::new_v4();
    let review = NewReview {
      product_id,
      user_id,
      rating: 4,
      title: None,
      comment: Some("Lovely fabric".into()),
    };
    store.create_review(review.clone()).await.unwrap();
    match store.create_review(review).await {
      Err(AppError::Validation(msg)) => assert_eq!(msg, "You have already reviewed this product"),
      other => panic!("expected validation error, got {:?}", other.map(|r| r.id)),
    }
  }

  #[tokio::test]
  async fn dashboard_counts_reflect_rows() {
    let store = MemoryStore::new();
    store.insert_profile(Uuid::new_v4(), Role::Customer, None);
    store.insert_profile(Uuid::new_v4(), Role::Admin, None);
    let product = store.create_product(&product_input("anarkali", 2)).await.unwrap();
    let order = store.create_order(new_order(Uuid::new_v4(), &product, 1)).await.unwrap();
    store
      .create_notification(NewNotification {
        kind: "new_order".into(),
        title: "New order".into(),
        message: "An order was placed".into(),
        order_id: Some(order.id),
      })
      .await
      .unwrap();

    let stats = store.dashboard_stats().await.unwrap();

    assert_eq!(
      stats,
      DashboardStats {
        total_orders: 1,
        pending_orders: 1,
        revenue_cents: 2499,
        low_stock: 1,
        unread_notifications: 1,
        total_customers: 1,
      }
    );
  }
}
