//! Storage Module - erasure-coded file representation
//!
//! Tracks how a file is split into erasure-coded chunks, which hosts hold
//! which pieces, and whether enough pieces exist to reconstruct the file.

mod chunk;
mod erasure;
mod metadata;
mod redundancy;
mod sia_file;

pub use chunk::{Piece, EXTENSION_INFO_SIZE, KEY_NONCE_SIZE};
pub use erasure::{
    ErasureCode, ErasureCodeType, ErasureCoder, ReedSolomonCode, ERASURE_CODE_PARAMS_SIZE,
};
pub use metadata::{reserved_metadata_size, Metadata, METADATA_PAGE_SIZE};
pub use redundancy::{HostStatusMap, RedundancyReport};
pub use sia_file::{FileUid, SiaFile, FILE_UID_SIZE};

use crate::identity::HostPublicKey;
use std::fmt;
use thiserror::Error;

/// Which index was out of range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Chunk,
    Piece,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chunk => write!(f, "chunkIndex"),
            Self::Piece => write!(f, "pieceIndex"),
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("{kind} {index} out of bounds ({bound})")]
    OutOfRange {
        kind: IndexKind,
        index: u64,
        bound: u64,
    },

    #[error("Invalid erasure code type: {0:?}")]
    InvalidErasureCodeType([u8; 4]),

    #[error("Invalid erasure code params: {0}")]
    InvalidErasureCodeParams(String),

    #[error("Erasure coding error: {0}")]
    ErasureCoding(String),

    #[error("Not enough pieces available: have {have}, need {need}")]
    InsufficientPieces { have: usize, need: usize },

    #[error("Host {0} is in one host status map but not the other")]
    InconsistentHostStatus(HostPublicKey),

    #[error("Invalid file: {0}")]
    InvalidFile(String),
}

impl From<reed_solomon_erasure::Error> for StorageError {
    fn from(err: reed_solomon_erasure::Error) -> Self {
        StorageError::ErasureCoding(err.to_string())
    }
}
