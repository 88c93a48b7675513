// src/api/signing.rs

use hmac::{Hmac, Mac};
use sha2::Sha256;

/// HMAC-SHA256 over the raw request body, hex-encoded. The generation worker
/// signs its callbacks with the shared secret; we recompute and compare.
pub fn sign_hmac_sha256_hex(secret: &str, data: &[u8]) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(data);
    let result = mac.finalize().into_bytes();
    hex::encode(result)
}

/// Constant-time verification of a hex-encoded HMAC-SHA256 signature.
pub fn verify_hmac_sha256_hex(secret: &str, data: &[u8], signature_hex: &str) -> bool {
    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(data);
    mac.verify_slice(&signature).is_ok()
}
