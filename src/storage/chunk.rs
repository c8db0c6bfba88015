//! Chunks and pieces
//!
//! A chunk owns one slot per erasure-coded piece. Each slot may hold several
//! copies of the same piece stored on different (or even the same) hosts.

use super::erasure::{ErasureCode, ErasureCoder, ERASURE_CODE_PARAMS_SIZE};
use crate::crypto::ContentHash;
use crate::identity::{HostKeyTable, HostPublicKey};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Size of the per-piece encryption nonce
pub const KEY_NONCE_SIZE: usize = 4;

/// Size of the reserved per-chunk extension area
pub const EXTENSION_INFO_SIZE: usize = 16;

/// A single stored copy of one piece, as shown to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    /// Nonce used to derive the piece cipher from the file's master key
    pub key_nonce: [u8; KEY_NONCE_SIZE],

    /// Host storing this copy
    pub host_key: HostPublicKey,

    /// Merkle root of the piece's bytes
    pub merkle_root: ContentHash,
}

/// Compact piece form kept inside a chunk; the host is a key table index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StoredPiece {
    pub key_nonce: [u8; KEY_NONCE_SIZE],
    pub host_index: u32,
    pub merkle_root: ContentHash,
}

impl StoredPiece {
    /// Resolve the host index against the file's key table
    pub fn resolve(&self, table: &HostKeyTable) -> Piece {
        let host_key = match table.get(self.host_index) {
            Some(key) => key.clone(),
            // Indices only come from `HostKeyTable::intern` on the same table
            None => unreachable!("piece references unknown host index {}", self.host_index),
        };
        Piece {
            key_nonce: self.key_nonce,
            host_key,
            merkle_root: self.merkle_root,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Chunk {
    pub erasure_code_type: [u8; 4],
    pub erasure_code_params: [u8; ERASURE_CODE_PARAMS_SIZE],
    pub erasure_code: Arc<ErasureCode>,

    /// Reserved, not interpreted here
    pub extension_info: [u8; EXTENSION_INFO_SIZE],

    /// One slot per piece index; the slot count never changes
    pub pieces: Vec<Vec<StoredPiece>>,
}

impl Chunk {
    pub fn new(erasure_code: Arc<ErasureCode>) -> Self {
        Self {
            erasure_code_type: erasure_code.type_tag(),
            erasure_code_params: erasure_code.params(),
            pieces: vec![Vec::new(); erasure_code.num_pieces()],
            erasure_code,
            extension_info: [0u8; EXTENSION_INFO_SIZE],
        }
    }

    pub fn min_pieces(&self) -> usize {
        self.erasure_code.min_pieces()
    }

    pub fn num_slots(&self) -> usize {
        self.pieces.len()
    }

    /// Payload bytes covered by this chunk; parity pieces don't count
    pub fn size(&self, piece_size: u64) -> u64 {
        piece_size * self.min_pieces() as u64
    }

    /// Deep copy of every slot with hosts resolved
    pub fn resolved_pieces(&self, table: &HostKeyTable) -> Vec<Vec<Piece>> {
        self.pieces
            .iter()
            .map(|slot| slot.iter().map(|piece| piece.resolve(table)).collect())
            .collect()
    }
}
