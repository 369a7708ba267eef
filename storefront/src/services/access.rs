// storefront/src/services/access.rs

//! Bearer-token verification and role checks.
//!
//! Tokens are issued by the managed auth backend and signed with HS256; this
//! service only verifies them. Roles come from the `profiles` table.

use crate::config::AuthSettings;
use crate::db::CustomerRepository;
use crate::errors::{AppError, Result};
use crate::models::Role;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

/// The verified caller, handed to handlers by the web extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
  pub user_id: Uuid,
  pub role: Role,
}

impl AuthContext {
  pub fn is_admin(&self) -> bool {
    self.role == Role::Admin
  }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
  pub sub: String,
  pub aud: String,
  pub exp: usize,
}

pub struct TokenVerifier {
  decoding_key: DecodingKey,
  validation: Validation,
}

impl TokenVerifier {
  pub fn new(settings: &AuthSettings) -> Self {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[settings.jwt_audience.as_str()]);
    Self {
      decoding_key: DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
      validation,
    }
  }

  /// Returns the user id carried in `sub`.
  pub fn verify(&self, token: &str) -> Result<Uuid> {
    let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
      debug!("JWT validation failed: {e}");
      AppError::Unauthorized("Invalid or expired token".to_string())
    })?;
    Uuid::parse_str(&data.claims.sub).map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))
  }
}

pub fn bearer_token(authorization: Option<&str>) -> Result<&str> {
  let header = authorization.ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;
  header
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or_else(|| AppError::Unauthorized("Invalid Authorization format".to_string()))
}

/// Verifies the bearer token. A caller without a profile row is treated as a customer.
pub async fn require_authenticated_user(
  verifier: &TokenVerifier,
  customers: &dyn CustomerRepository,
  authorization: Option<&str>,
) -> Result<AuthContext> {
  let user_id = verifier.verify(bearer_token(authorization)?)?;
  let role = customers.role_of(user_id).await?.unwrap_or(Role::Customer);
  Ok(AuthContext { user_id, role })
}

/// As [`require_authenticated_user`], and the profile must carry the admin role.
pub async fn require_admin_role(
  verifier: &TokenVerifier,
  customers: &dyn CustomerRepository,
  authorization: Option<&str>,
) -> Result<AuthContext> {
  let user_id = verifier.verify(bearer_token(authorization)?)?;
  match customers.role_of(user_id).await? {
    Some(Role::Admin) => Ok(AuthContext {
      user_id,
      role: Role::Admin,
    }),
    Some(Role::Customer) => {
      warn!(user_id = %user_id, "Customer attempted to reach an admin endpoint.");
      Err(AppError::Forbidden("Admin access required".to_string()))
    }
    None => {
      warn!(user_id = %user_id, "Caller without a profile attempted to reach an admin endpoint.");
      Err(AppError::Forbidden("Admin access required".to_string()))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::memory::MemoryStore;
  use jsonwebtoken::{EncodingKey, Header};

  fn settings() -> AuthSettings {
    AuthSettings {
      jwt_secret: "unit-test-secret".to_string(),
      jwt_audience: "authenticated".to_string(),
    }
  }

  fn token_for(user_id: Uuid, audience: &str, secret: &str) -> String {
    let claims = TokenClaims {
      sub: user_id.to_string(),
      aud: audience.to_string(),
      exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
    };
    jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
  }

  #[test]
  fn verifies_subject() {
    let verifier = TokenVerifier::new(&settings());
    let user_id = Uuid::new_v4();
    let token = token_for(user_id, "authenticated", "unit-test-secret");
    assert_eq!(verifier.verify(&token).unwrap(), user_id);
  }

  #[test]
  fn rejects_wrong_secret_and_audience() {
    let verifier = TokenVerifier::new(&settings());
    let user_id = Uuid::new_v4();
    assert!(matches!(
      verifier.verify(&token_for(user_id, "authenticated", "other-secret")),
      Err(AppError::Unauthorized(_))
    ));
    assert!(matches!(
      verifier.verify(&token_for(user_id, "anon", "unit-test-secret")),
      Err(AppError::Unauthorized(_))
    ));
  }

  #[test]
  fn bearer_prefix_is_required() {
    assert!(bearer_token(None).is_err());
    assert!(bearer_token(Some("Basic abc")).is_err());
    assert!(bearer_token(Some("Bearer ")).is_err());
    assert_eq!(bearer_token(Some("Bearer abc.def")).unwrap(), "abc.def");
  }

  #[tokio::test]
  async fn admin_role_comes_from_profile() {
    let verifier = TokenVerifier::new(&settings());
    let store = MemoryStore::new();
    let admin_id = Uuid::new_v4();
    let customer_id = Uuid::new_v4();
    store.insert_profile(admin_id, Role::Admin, Some("Owner"));
    store.insert_profile(customer_id, Role::Customer, None);

    let admin_header = format!("Bearer {}", token_for(admin_id, "authenticated", "unit-test-secret"));
    let customer_header = format!("Bearer {}", token_for(customer_id, "authenticated", "unit-test-secret"));
    let stranger_header = format!("Bearer {}", token_for(Uuid::new_v4(), "authenticated", "unit-test-secret"));

    let ctx = require_admin_role(&verifier, &store, Some(&admin_header)).await.unwrap();
    assert!(ctx.is_admin());
    assert!(matches!(
      require_admin_role(&verifier, &store, Some(&customer_header)).await,
      Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
      require_admin_role(&verifier, &store, Some(&stranger_header)).await,
      Err(AppError::Forbidden(_))
    ));
    let stranger = require_authenticated_user(&verifier, &store, Some(&stranger_header)).await.unwrap();
    assert_eq!(stranger.role, Role::Customer);
  }
}
