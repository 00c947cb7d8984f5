//! HMAC signing and verification
//!
//! Auth tokens and webhook signatures both use hex-encoded HMAC-SHA256 over
//! the application's shared secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Owns the shared secret and the public key, and computes or checks
/// signatures on their behalf. Immutable once constructed.
#[derive(Clone)]
pub struct Signer {
    key: String,
    secret: Vec<u8>,
}

impl Signer {
    pub fn new(key: impl Into<String>, secret: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }

    /// The public application key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Hex-encoded HMAC-SHA256 digest of `message`
    pub fn sign(&self, message: &[u8]) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(message);
        hex::encode(mac.finalize().into_bytes())
    }

    /// Check a hex-encoded signature against `message`.
    ///
    /// Returns false for an empty or malformed signature rather than
    /// failing; the comparison itself is constant-time.
    pub fn verify(&self, message: &[u8], signature: &str) -> bool {
        if signature.is_empty() {
            return false;
        }

        let raw = match hex::decode(signature) {
            Ok(raw) => raw,
            Err(_) => return false,
        };

        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(message);
        mac.verify_slice(&raw).is_ok()
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signer(key: {}, secret: [REDACTED])", self.key)
    }
}
