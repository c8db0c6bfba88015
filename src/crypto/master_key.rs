//! File master key
//!
//! Every file gets one symmetric master key when it is created. Piece
//! ciphers are derived from it by an external layer together with the
//! per-piece nonce; the key itself is never rotated.

use super::CryptoError;
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;

pub const MASTER_KEY_SIZE: usize = 32;

/// Symmetric master key of a single file
#[derive(Clone, PartialEq, Eq)]
pub struct MasterKey {
    key: [u8; MASTER_KEY_SIZE],
}

impl MasterKey {
    /// Create a master key from raw bytes
    pub fn new(key: [u8; MASTER_KEY_SIZE]) -> Self {
        Self { key }
    }

    /// Generate a random master key from the OS entropy source
    pub fn generate() -> Self {
        let mut key = [0u8; MASTER_KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        Self { key }
    }

    /// Create a master key from a slice, checking its length
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let key: [u8; MASTER_KEY_SIZE] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidKey(format!(
                "expected {} bytes, got {}",
                MASTER_KEY_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self { key })
    }

    /// Get the raw key bytes (be careful with this!)
    pub fn as_bytes(&self) -> &[u8; MASTER_KEY_SIZE] {
        &self.key
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey(..)")
    }
}
