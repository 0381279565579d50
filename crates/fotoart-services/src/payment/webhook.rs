use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex HMAC-SHA256 of the raw webhook body
pub const SIGNATURE_HEADER: &str = "X-Content-HMAC";

/// Processor notification body: `{event, object: {id, status}}`
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookNotification {
    pub event: String,
    pub object: WebhookObject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookObject {
    pub id: String,
    pub status: String,
}

/// Hex HMAC-SHA256 of `body` under `secret`
pub fn sign_payload(secret: &str, body: &[u8]) -> String {
    // new_from_slice accepts keys of any length for HMAC
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time check of a hex signature against `body`.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let expected = sign_payload(secret, body);
    let provided = signature.trim().to_ascii_lowercase();
    if expected.is_empty() || expected.len() != provided.len() {
        return false;
    }
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}
