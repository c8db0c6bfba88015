//! The file aggregate
//!
//! A `SiaFile` owns the metadata, the host key table and the ordered chunks
//! of one file. A single reader-writer lock covers all of it, so queries
//! that span chunks always see one consistent snapshot. Reads copy data out
//! before the lock is released.

use super::chunk::{Chunk, Piece, StoredPiece, EXTENSION_INFO_SIZE};
use super::erasure::{ErasureCode, ERASURE_CODE_PARAMS_SIZE};
use super::metadata::Metadata;
use super::redundancy::{self, HostStatusMap, RedundancyReport};
use super::{IndexKind, StorageError};
use crate::crypto::{self, ContentHash, MasterKey};
use crate::identity::{HostKeyTable, HostPublicKey};
use parking_lot::RwLock;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const FILE_UID_SIZE: usize = 20;

/// Random identifier of an in-memory file; not persisted
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileUid([u8; FILE_UID_SIZE]);

impl FileUid {
    fn generate() -> Self {
        Self(crypto::random_array())
    }

    pub fn as_bytes(&self) -> &[u8; FILE_UID_SIZE] {
        &self.0
    }
}

impl fmt::Debug for FileUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileUid({})", hex::encode(self.0))
    }
}

impl fmt::Display for FileUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

struct FileState {
    metadata: Metadata,
    host_keys: HostKeyTable,
    chunks: Vec<Chunk>,
    deleted: bool,
}

impl FileState {
    fn out_of_range(&self, chunk_index: u64) -> StorageError {
        StorageError::OutOfRange {
            kind: IndexKind::Chunk,
            index: chunk_index,
            bound: self.chunks.len() as u64,
        }
    }

    fn try_chunk(&self, chunk_index: u64) -> Result<&Chunk, StorageError> {
        usize::try_from(chunk_index)
            .ok()
            .and_then(|i| self.chunks.get(i))
            .ok_or_else(|| self.out_of_range(chunk_index))
    }

    /// Accessor for callers that must already have checked `num_chunks`
    fn chunk(&self, chunk_index: u64) -> &Chunk {
        match self.try_chunk(chunk_index) {
            Ok(chunk) => chunk,
            Err(err) => panic!("{}", err),
        }
    }
}

/// A file uploaded to the network, split into erasure-coded chunks
pub struct SiaFile {
    uid: FileUid,
    state: RwLock<FileState>,
}

impl SiaFile {
    /// Create a file with one chunk per erasure code, in the given order.
    ///
    /// A fresh master key and uid are generated. Non-empty files need at
    /// least one chunk and a non-zero piece size, and every chunk's size
    /// must fit in a `u64`.
    pub fn new(
        sia_path: impl Into<String>,
        erasure_codes: Vec<Arc<ErasureCode>>,
        piece_size: u64,
        file_size: u64,
        mode: u32,
        source: impl Into<PathBuf>,
    ) -> Result<Self, StorageError> {
        if file_size > 0 && erasure_codes.is_empty() {
            return Err(StorageError::InvalidFile(
                "a non-empty file needs at least one chunk".into(),
            ));
        }
        if file_size > 0 && piece_size == 0 {
            return Err(StorageError::InvalidFile(
                "piece size must be > 0 for a non-empty file".into(),
            ));
        }
        let chunks: Vec<Chunk> = erasure_codes.into_iter().map(Chunk::new).collect();
        if let Some(chunk) = chunks
            .iter()
            .find(|chunk| piece_size.checked_mul(chunk.min_pieces() as u64).is_none())
        {
            return Err(StorageError::InvalidFile(format!(
                "chunk size overflows: {} pieces of {} bytes",
                chunk.min_pieces(),
                piece_size
            )));
        }

        let metadata = Metadata {
            file_size,
            local_path: source.into(),
            master_key: MasterKey::generate(),
            mode,
            piece_size,
            sia_path: sia_path.into(),
        };
        let uid = FileUid::generate();

        tracing::debug!(
            sia_path = %metadata.sia_path,
            %uid,
            chunks = chunks.len(),
            file_size,
            "created file"
        );

        Ok(Self {
            uid,
            state: RwLock::new(FileState {
                metadata,
                host_keys: HostKeyTable::new(),
                chunks,
                deleted: false,
            }),
        })
    }

    /// Record an uploaded piece.
    ///
    /// The host is added to the key table if it is new. Nothing is
    /// deduplicated within the slot: registering the same piece twice stores
    /// two entries. On error the file is left untouched.
    pub fn add_piece(
        &self,
        host_key: &HostPublicKey,
        chunk_index: u64,
        piece_index: u64,
        merkle_root: ContentHash,
    ) -> Result<(), StorageError> {
        let mut state = self.state.write();

        let num_slots = state.try_chunk(chunk_index)?.num_slots() as u64;
        if piece_index >= num_slots {
            return Err(StorageError::OutOfRange {
                kind: IndexKind::Piece,
                index: piece_index,
                bound: num_slots,
            });
        }

        let host_index = state.host_keys.intern(host_key);
        let piece = StoredPiece {
            key_nonce: crypto::random_array(),
            host_index,
            merkle_root,
        };
        state.chunks[chunk_index as usize].pieces[piece_index as usize].push(piece);
        Ok(())
    }

    /// Every piece copy of a chunk, one vector per piece index.
    ///
    /// The result is a deep copy and never aliases the file's state.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_index >= self.num_chunks()`.
    pub fn pieces(&self, chunk_index: u64) -> Vec<Vec<Piece>> {
        let state = self.state.read();
        state.chunk(chunk_index).resolved_pieces(&state.host_keys)
    }

    /// Number of chunks, whether or not they are uploaded yet
    pub fn num_chunks(&self) -> u64 {
        self.state.read().chunks.len() as u64
    }

    /// # Panics
    ///
    /// Panics if `chunk_index >= self.num_chunks()`.
    pub fn erasure_code(&self, chunk_index: u64) -> Arc<ErasureCode> {
        self.state.read().chunk(chunk_index).erasure_code.clone()
    }

    /// Encoded erasure code type tag and parameters of a chunk
    ///
    /// # Panics
    ///
    /// Panics if `chunk_index >= self.num_chunks()`.
    pub fn erasure_code_encoding(
        &self,
        chunk_index: u64,
    ) -> ([u8; 4], [u8; ERASURE_CODE_PARAMS_SIZE]) {
        let state = self.state.read();
        let chunk = state.chunk(chunk_index);
        (chunk.erasure_code_type, chunk.erasure_code_params)
    }

    /// Reserved extension bytes of a chunk
    ///
    /// # Panics
    ///
    /// Panics if `chunk_index >= self.num_chunks()`.
    pub fn extension_info(&self, chunk_index: u64) -> [u8; EXTENSION_INFO_SIZE] {
        self.state.read().chunk(chunk_index).extension_info
    }

    pub fn uid(&self) -> FileUid {
        self.uid
    }

    /// Payload bytes covered by a chunk
    ///
    /// # Panics
    ///
    /// Panics if `chunk_index >= self.num_chunks()`.
    pub fn chunk_size(&self, chunk_index: u64) -> u64 {
        let state = self.state.read();
        state.chunk(chunk_index).size(state.metadata.piece_size)
    }

    /// Chunk containing `offset` and the offset relative to that chunk.
    ///
    /// If `offset` lies past the last chunk the returned index equals
    /// `num_chunks()` and the second value is the distance past the end.
    pub fn chunk_index_by_offset(&self, offset: u64) -> (u64, u64) {
        let state = self.state.read();
        let piece_size = state.metadata.piece_size;
        let mut offset = offset;
        for (chunk_index, chunk) in state.chunks.iter().enumerate() {
            let size = chunk.size(piece_size);
            if offset < size {
                return (chunk_index as u64, offset);
            }
            offset -= size;
        }
        (state.chunks.len() as u64, offset)
    }

    /// Whether enough pieces are online to download every chunk.
    ///
    /// Hosts missing from `offline` are treated as online.
    pub fn available(&self, offline: &HostStatusMap) -> bool {
        let state = self.state.read();
        redundancy::available(&state.chunks, &state.host_keys, offline)
    }

    /// Redundancy of the least redundant chunk, or -1 for an empty file.
    ///
    /// See `RedundancyReport::effective` for which figure is returned.
    pub fn redundancy(&self, offline: &HostStatusMap, good_for_renew: &HostStatusMap) -> f64 {
        self.redundancy_report(offline, good_for_renew).effective()
    }

    /// Both redundancy figures plus any hosts with inconsistent status
    pub fn redundancy_report(
        &self,
        offline: &HostStatusMap,
        good_for_renew: &HostStatusMap,
    ) -> RedundancyReport {
        let state = self.state.read();
        redundancy::redundancy(
            state.metadata.file_size,
            &state.chunks,
            &state.host_keys,
            offline,
            good_for_renew,
        )
    }

    /// Hosts this file has pieces on, in the order they were first seen
    pub fn host_public_keys(&self) -> Vec<HostPublicKey> {
        self.state.read().host_keys.to_vec()
    }

    /// Snapshot of the metadata
    pub fn metadata(&self) -> Metadata {
        self.state.read().metadata.clone()
    }

    pub fn size(&self) -> u64 {
        self.state.read().metadata.file_size
    }

    pub fn piece_size(&self) -> u64 {
        self.state.read().metadata.piece_size
    }

    pub fn sia_path(&self) -> String {
        self.state.read().metadata.sia_path.clone()
    }

    pub fn local_path(&self) -> PathBuf {
        self.state.read().metadata.local_path.clone()
    }

    pub fn mode(&self) -> u32 {
        self.state.read().metadata.mode
    }

    pub fn master_key(&self) -> MasterKey {
        self.state.read().metadata.master_key.clone()
    }

    pub fn rename(&self, new_sia_path: impl Into<String>) {
        let new_sia_path = new_sia_path.into();
        let mut state = self.state.write();
        tracing::debug!(from = %state.metadata.sia_path, to = %new_sia_path, "renamed file");
        state.metadata.sia_path = new_sia_path;
    }

    /// Pass an empty path once the file only lives on the network
    pub fn set_local_path(&self, path: impl AsRef<Path>) {
        self.state.write().metadata.local_path = path.as_ref().to_path_buf();
    }

    pub fn set_mode(&self, mode: u32) {
        self.state.write().metadata.mode = mode;
    }

    /// Mark the file as deleted; its chunks are kept
    pub fn delete(&self) {
        self.state.write().deleted = true;
    }

    pub fn is_deleted(&self) -> bool {
        self.state.read().deleted
    }
}

impl fmt::Debug for SiaFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("SiaFile")
            .field("uid", &self.uid)
            .field("sia_path", &state.metadata.sia_path)
            .field("file_size", &state.metadata.file_size)
            .field("chunks", &state.chunks.len())
            .field("hosts", &state.host_keys.len())
            .field("deleted", &state.deleted)
            .finish()
    }
}
