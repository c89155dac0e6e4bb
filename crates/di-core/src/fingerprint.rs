//! Content fingerprints used as cache-key material.
//!
//! SHA-256 over the raw bytes, rendered as 64 lowercase hex characters.
//! Stable across processes and platforms; not used for authentication.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Digest a single payload.
    pub fn of(payload: impl AsRef<[u8]>) -> Self {
        Self(format!("{:x}", Sha256::digest(payload.as_ref())))
    }

    /// Digest the concatenation `first || second` without allocating it.
    ///
    /// Equal to `Fingerprint::of([first, second].concat())`.
    pub fn of_pair(first: impl AsRef<[u8]>, second: impl AsRef<[u8]>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(first.as_ref());
        hasher.update(second.as_ref());
        Self(format!("{:x}", hasher.finalize()))
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
