//! Content fingerprints for generated artifacts.
//!
//! The convergence loop remembers a [`ContentHash`] of everything it writes.
//! When the persisted content later stops matching that fingerprint, somebody
//! other than the loop edited a machine-owned file.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub type HashError = serde_json::Error;

/// A full 64-character SHA-256 hash, lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl ContentHash {
  /// Short form for log lines.
  pub fn short(&self) -> &str {
    &self.0[..self.0.len().min(12)]
  }
}

/// Types whose serialized form can be fingerprinted.
pub trait Hashable: Serialize {
  fn compute_hash(&self) -> Result<ContentHash, HashError> {
    let serialized = serde_json::to_string(self)?;
    Ok(hash_bytes(serialized.as_bytes()))
  }
}

impl Hashable for String {}

impl Hashable for serde_json::Value {}

impl Hashable for BTreeMap<String, String> {}

/// Hash arbitrary bytes.
pub fn hash_bytes(data: &[u8]) -> ContentHash {
  let mut hasher = Sha256::new();
  hasher.update(data);
  ContentHash(hex::encode(hasher.finalize()))
}
