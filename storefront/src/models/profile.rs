// storefront/src/models/profile.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "user_role_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Customer,
  Admin,
}

/// A customer profile. `id` is the user id issued by the auth backend.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Profile {
  pub id: Uuid,
  pub full_name: Option<String>,
  pub email: Option<String>,
  pub phone: Option<String>,
  pub role: Role,
  pub address_line1: Option<String>,
  pub address_line2: Option<String>,
  pub city: Option<String>,
  pub state: Option<String>,
  pub postcode: Option<String>,
  pub country: Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Client-writable profile fields. The role is deliberately absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
  pub full_name: Option<String>,
  pub email: Option<String>,
  pub phone: Option<String>,
  pub address_line1: Option<String>,
  pub address_line2: Option<String>,
  pub city: Option<String>,
  pub state: Option<String>,
  pub postcode: Option<String>,
  pub country: Option<String>,
}

impl ProfileUpdate {
  pub fn apply_to(self, profile: &mut Profile) {
    let fields = [
      (self.full_name, &mut profile.full_name),
      (self.email, &mut profile.email),
      (self.phone, &mut profile.phone),
      (self.address_line1, &mut profile.address_line1),
      (self.address_line2, &mut profile.address_line2),
      (self.city, &mut profile.city),
      (self.state, &mut profile.state),
      (self.postcode, &mut profile.postcode),
      (self.country, &mut profile.country),
    ];
    for (value, target) in fields {
      if value.is_some() {
        *target = value;
      }
    }
  }
}
