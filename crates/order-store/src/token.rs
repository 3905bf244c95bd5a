//! Cancellation token generation.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;

/// How long an issued cancellation token stays redeemable.
pub const CANCEL_TOKEN_TTL_DAYS: i64 = 30;

/// Generates a cryptographically random URL-safe token (32 bytes of
/// entropy, base64url without padding).
pub fn generate() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(bytes)
}
