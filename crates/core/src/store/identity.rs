//! Request-identity key generation.
//!
//! A cache entry is keyed by the (method, canonical URL) pair. Callers
//! canonicalize the URL before hashing so that `/a#frag` and `/a` share
//! an identity while `/a?x=1` and `/a?x=2` do not.

use sha2::{Digest, Sha256};

/// Compute the store key for a request.
pub fn request_identity(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
