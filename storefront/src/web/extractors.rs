// storefront/src/web/extractors.rs

//! Request extractors that verify the caller before a handler runs.

use crate::errors::AppError;
use crate::services::access::{require_admin_role, require_authenticated_user, AuthContext};
use crate::state::AppState;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use std::ops::Deref;

fn request_parts(req: &HttpRequest) -> Result<(web::Data<AppState>, Option<String>), AppError> {
  let state = req
    .app_data::<web::Data<AppState>>()
    .cloned()
    .ok_or_else(|| AppError::Internal("AppState is not registered".to_string()))?;
  let authorization = req
    .headers()
    .get(AUTHORIZATION)
    .and_then(|value| value.to_str().ok())
    .map(str::to_string);
  Ok((state, authorization))
}

/// Any caller with a valid bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub AuthContext);

impl Deref for AuthenticatedUser {
  type Target = AuthContext;

  fn deref(&self) -> &AuthContext {
    &self.0
  }
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let parts = request_parts(req);
    Box::pin(async move {
      let (state, authorization) = parts?;
      let ctx =
        require_authenticated_user(&state.tokens, state.repos.customers.as_ref(), authorization.as_deref()).await?;
      Ok(AuthenticatedUser(ctx))
    })
  }
}

/// A caller whose profile carries the admin role.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub AuthContext);

impl Deref for AdminUser {
  type Target = AuthContext;

  fn deref(&self) -> &AuthContext {
    &self.0
  }
}

impl FromRequest for AdminUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let parts = request_parts(req);
    Box::pin(async move {
      let (state, authorization) = parts?;
      let ctx = require_admin_role(&state.tokens, state.repos.customers.as_ref(), authorization.as_deref()).await?;
      Ok(AdminUser(ctx))
    })
  }
}
