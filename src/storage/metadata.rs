//! Per-file metadata

use crate::crypto::MasterKey;
use std::path::PathBuf;

/// Persisted metadata regions are reserved in whole pages of this size so a
/// persistence layer can rewrite them in place.
pub const METADATA_PAGE_SIZE: u64 = 4096;

/// Bytes to reserve for a metadata region of `len` bytes
pub fn reserved_metadata_size(len: u64) -> u64 {
    len.div_ceil(METADATA_PAGE_SIZE).max(1) * METADATA_PAGE_SIZE
}

/// Mostly static metadata of a file
#[derive(Debug, Clone)]
pub struct Metadata {
    /// Size of the file in bytes
    pub file_size: u64,

    /// Local source of the file; empty once it only lives on the network
    pub local_path: PathBuf,

    /// Never rotated
    pub master_key: MasterKey,

    /// Unix permission bits
    pub mode: u32,

    /// Size of every piece of the file
    pub piece_size: u64,

    /// Logical path of the file within the renter
    pub sia_path: String,
}
