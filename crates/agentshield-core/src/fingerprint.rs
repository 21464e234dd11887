//! Policy snapshot fingerprinting, grounded on `assay-core::fingerprint`: a
//! deterministic SHA-256 hex digest over a policy's canonical serialization,
//! computed once at engine-build time and logged so an operator can tell
//! which on-disk policy (plus which merged packs) a running engine is
//! actually enforcing.

use sha2::{Digest, Sha256};

/// SHA-256 of `s`, hex-encoded.
#[must_use]
pub fn sha256_hex(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    hex::encode(hasher.finalize())
}

/// Fingerprint a policy snapshot from its canonical (serde-stable) JSON
/// serialization. Two policies that serialize identically always fingerprint
/// identically, regardless of how they were loaded (base only vs. base plus
/// packs that happened to contribute nothing new).
#[must_use]
pub fn fingerprint(canonical_json: &str) -> String {
    sha256_hex(canonical_json)
}
