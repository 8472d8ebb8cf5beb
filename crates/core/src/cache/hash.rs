//! Content digests for stored response bodies.

use sha2::{Digest, Sha256};

/// Compute the hex SHA-256 digest of a response body.
pub fn compute_body_digest(body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    hex::encode(hasher.finalize())
}
