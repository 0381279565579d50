//! URL-safe random tokens drawn from the operating system CSPRNG.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand_core::{OsRng, RngCore};

/// Random bytes behind a short-link token
pub const SHORT_LINK_TOKEN_BYTES: usize = 16;

/// Random bytes behind a password reset token
pub const RESET_TOKEN_BYTES: usize = 32;

/// `len` random bytes, base64url without padding. The alphabet is
/// `A-Z a-z 0-9 - _`, so the token can sit in a URL path unescaped.
pub fn random_url_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
