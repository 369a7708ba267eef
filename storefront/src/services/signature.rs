// storefront/src/services/signature.rs

//! HMAC-SHA256 signatures in lowercase hex, as used by the payment gateway
//! and the carrier webhook.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub fn sign_hex(secret: &str, message: &[u8]) -> String {
  // HMAC accepts keys of any length.
  let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
    Ok(mac) => mac,
    Err(_) => return String::new(),
  };
  mac.update(message);
  hex::encode(mac.finalize().into_bytes())
}

/// Constant-time check of a hex signature. Malformed hex never verifies.
pub fn verify_hex(secret: &str, message: &[u8], signature_hex: &str) -> bool {
  let Ok(expected) = hex::decode(signature_hex.trim()) else {
    return false;
  };
  let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
    return false;
  };
  mac.update(message);
  mac.verify_slice(&expected).is_ok()
}
