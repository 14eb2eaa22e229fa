//! Content digests of serialized reports.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// SHA-256 of the JSON serialization of `value`, as lowercase hex.
pub fn compute_digest<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(value)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
