//! Content hashing using BLAKE3
//!
//! Pieces are bound to their exact bytes by a Merkle root computed over
//! fixed-size segments.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of a Merkle tree leaf in bytes
pub const SEGMENT_SIZE: usize = 64;

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;

/// Content hash using BLAKE3 (32 bytes)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash data and return content hash
    pub fn hash(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(arr))
    }

    /// Convert to base58 string (shorter, URL-safe)
    pub fn to_base58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    /// Compute the Merkle root of a piece.
    ///
    /// The data is split into `SEGMENT_SIZE` leaves (the last one may be
    /// short). Leaves and interior nodes are hashed with distinct one-byte
    /// prefixes so a leaf can never collide with a node. An odd node at the
    /// end of a level is promoted unchanged.
    pub fn merkle_root(data: &[u8]) -> Self {
        if data.is_empty() {
            return Self::leaf(&[]);
        }

        let mut level: Vec<ContentHash> = data.chunks(SEGMENT_SIZE).map(Self::leaf).collect();
        while level.len() > 1 {
            level = level
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => Self::node(left, right),
                    [single] => *single,
                    _ => unreachable!("chunks(2) yields one or two elements"),
                })
                .collect();
        }
        level[0]
    }

    /// Verify that data matches this hash as a Merkle root
    pub fn verify_merkle_root(&self, data: &[u8]) -> bool {
        Self::merkle_root(data) == *self
    }

    fn leaf(segment: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&[LEAF_PREFIX]);
        hasher.update(segment);
        Self(*hasher.finalize().as_bytes())
    }

    fn node(left: &ContentHash, right: &ContentHash) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&[NODE_PREFIX]);
        hasher.update(&left.0);
        hasher.update(&right.0);
        Self(*hasher.finalize().as_bytes())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
