//! Content fingerprints for the analysis cache
//!
//! SHA-256 over the UTF-8 bytes of the full extracted text. Keys persist in
//! browser storage, so the digest must be stable across builds and platforms.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(text: &str) -> Self {
        Fingerprint(hex::encode(Sha256::digest(text.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `<namespace>-v<version>-<fingerprint>`
pub fn storage_key(namespace: &str, version: u32, fingerprint: &Fingerprint) -> String {
    format!("{}-v{}-{}", namespace, version, fingerprint)
}
