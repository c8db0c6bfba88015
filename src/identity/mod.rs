//! Identity Module - storage host identities
//!
//! A host is identified by an algorithm specifier plus its public key bytes.
//! Files keep a deduplicated table of the hosts their pieces live on.

mod keys;
mod table;

pub use table::HostKeyTable;

#[cfg(test)]
pub(crate) use keys::random_host_key;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Unknown key algorithm: {0}")]
    UnknownAlgorithm(String),
}

/// Length of an algorithm specifier
pub const SPECIFIER_LEN: usize = 16;

/// Fixed-width, zero-padded algorithm name
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Specifier([u8; SPECIFIER_LEN]);

impl Specifier {
    pub const ED25519: Specifier = Specifier::new("ed25519");

    /// Build a specifier from a name of at most 16 bytes.
    ///
    /// Longer names are truncated.
    pub const fn new(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut out = [0u8; SPECIFIER_LEN];
        let mut i = 0;
        while i < bytes.len() && i < SPECIFIER_LEN {
            out[i] = bytes[i];
            i += 1;
        }
        Self(out)
    }

    pub fn as_bytes(&self) -> &[u8; SPECIFIER_LEN] {
        &self.0
    }

    /// The name without trailing padding
    pub fn name(&self) -> String {
        let end = self.0.iter().position(|b| *b == 0).unwrap_or(SPECIFIER_LEN);
        String::from_utf8_lossy(&self.0[..end]).into_owned()
    }
}

impl fmt::Debug for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Specifier({})", self.name())
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Public key of a storage host.
///
/// Two keys are the same host iff both the algorithm and the key bytes are
/// byte-for-byte equal.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostPublicKey {
    pub algorithm: Specifier,
    pub key: Vec<u8>,
}

impl HostPublicKey {
    pub fn new(algorithm: Specifier, key: impl Into<Vec<u8>>) -> Self {
        Self {
            algorithm,
            key: key.into(),
        }
    }

    /// Short form for logs
    pub fn short(&self) -> String {
        let hex = hex::encode(&self.key);
        format!("{}:{}", self.algorithm, &hex[..hex.len().min(16)])
    }
}

impl fmt::Debug for HostPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostPublicKey({})", self.short())
    }
}

impl fmt::Display for HostPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, hex::encode(&self.key))
    }
}

impl FromStr for HostPublicKey {
    type Err = IdentityError;

    /// Parse the `algorithm:hex` form produced by `Display`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (algorithm, key) = s
            .split_once(':')
            .ok_or_else(|| IdentityError::InvalidKey(format!("missing algorithm in {:?}", s)))?;
        if algorithm.is_empty() || algorithm.len() > SPECIFIER_LEN {
            return Err(IdentityError::UnknownAlgorithm(algorithm.to_string()));
        }
        let key = hex::decode(key).map_err(|e| IdentityError::InvalidKey(e.to_string()))?;
        Ok(Self::new(Specifier::new(algorithm), key))
    }
}
