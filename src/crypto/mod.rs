//! Cryptography Module - hashing and key material for stored files
//!
//! Provides BLAKE3 content hashes / Merkle roots and the per-file master key.
//! Piece encryption itself happens outside this crate.

mod hashing;
mod master_key;

pub use hashing::{ContentHash, SEGMENT_SIZE};
pub use master_key::{MasterKey, MASTER_KEY_SIZE};

use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Secure random fixed-size array
pub fn random_array<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    OsRng.fill_bytes(&mut bytes);
    bytes
}
