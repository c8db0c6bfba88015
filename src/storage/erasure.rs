//! Erasure Coding using Reed-Solomon
//!
//! Splits a chunk into `num_pieces` shards where any `min_pieces` of them are
//! enough to reconstruct it. On disk a coder is identified by a 4-byte type
//! tag and an 8-byte parameter blob; `ErasureCode::from_encoded` turns that
//! pair back into a coder.

use super::StorageError;
use reed_solomon_erasure::galois_8::ReedSolomon;
use std::fmt;

/// Size of the encoded erasure code parameters
pub const ERASURE_CODE_PARAMS_SIZE: usize = 8;

/// Galois field GF(2^8) cannot address more shards than this
const MAX_TOTAL_PIECES: usize = 256;

/// Capabilities shared by every erasure coding algorithm
pub trait ErasureCoder: Send + Sync {
    /// Pieces needed to reconstruct a chunk
    fn min_pieces(&self) -> usize;

    /// Pieces produced per chunk
    fn num_pieces(&self) -> usize;

    /// Split `data` into `num_pieces` equally sized pieces.
    ///
    /// The data is zero-padded to a multiple of `min_pieces`.
    fn encode(&self, data: &[u8]) -> Result<Vec<Vec<u8>>, StorageError>;

    /// Rebuild the first `n` payload bytes from the available pieces.
    ///
    /// `pieces` must hold `num_pieces` entries with missing pieces as `None`.
    fn recover(&self, pieces: Vec<Option<Vec<u8>>>, n: usize) -> Result<Vec<u8>, StorageError>;
}

/// Algorithm tag stored in front of the erasure code parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErasureCodeType {
    Invalid,
    ReedSolomon,
}

impl ErasureCodeType {
    pub fn tag(self) -> [u8; 4] {
        match self {
            Self::Invalid => [0, 0, 0, 0],
            Self::ReedSolomon => [0, 0, 0, 1],
        }
    }

    /// Unknown tags map to `Invalid`
    pub fn from_tag(tag: [u8; 4]) -> Self {
        match tag {
            [0, 0, 0, 1] => Self::ReedSolomon,
            _ => Self::Invalid,
        }
    }
}

/// Reed-Solomon coder over GF(2^8)
pub struct ReedSolomonCode {
    data_pieces: usize,
    parity_pieces: usize,
    // None when there are no parity pieces: the code degenerates to a split
    rs: Option<ReedSolomon>,
}

impl ReedSolomonCode {
    pub fn new(data_pieces: usize, parity_pieces: usize) -> Result<Self, StorageError> {
        if data_pieces == 0 {
            return Err(StorageError::InvalidErasureCodeParams(
                "data pieces must be > 0".into(),
            ));
        }
        if data_pieces
            .checked_add(parity_pieces)
            .filter(|total| *total <= MAX_TOTAL_PIECES)
            .is_none()
        {
            return Err(StorageError::InvalidErasureCodeParams(format!(
                "{} data + {} parity pieces exceeds the maximum of {}",
                data_pieces, parity_pieces, MAX_TOTAL_PIECES
            )));
        }
        let rs = if parity_pieces > 0 {
            Some(ReedSolomon::new(data_pieces, parity_pieces)?)
        } else {
            None
        };
        Ok(Self {
            data_pieces,
            parity_pieces,
            rs,
        })
    }

    pub fn data_pieces(&self) -> usize {
        self.data_pieces
    }

    pub fn parity_pieces(&self) -> usize {
        self.parity_pieces
    }

    fn piece_size(&self, data_len: usize) -> usize {
        data_len.div_ceil(self.data_pieces).max(1)
    }
}

impl fmt::Debug for ReedSolomonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReedSolomonCode")
            .field("data_pieces", &self.data_pieces)
            .field("parity_pieces", &self.parity_pieces)
            .finish()
    }
}

impl ErasureCoder for ReedSolomonCode {
    fn min_pieces(&self) -> usize {
        self.data_pieces
    }

    fn num_pieces(&self) -> usize {
        self.data_pieces + self.parity_pieces
    }

    fn encode(&self, data: &[u8]) -> Result<Vec<Vec<u8>>, StorageError> {
        let piece_size = self.piece_size(data.len());

        let mut padded = data.to_vec();
        padded.resize(piece_size * self.data_pieces, 0);

        let mut pieces: Vec<Vec<u8>> = padded.chunks(piece_size).map(|c| c.to_vec()).collect();
        pieces.resize(self.num_pieces(), vec![0u8; piece_size]);

        if let Some(rs) = &self.rs {
            rs.encode(&mut pieces)?;
        }
        Ok(pieces)
    }

    fn recover(&self, mut pieces: Vec<Option<Vec<u8>>>, n: usize) -> Result<Vec<u8>, StorageError> {
        if pieces.len() != self.num_pieces() {
            return Err(StorageError::ErasureCoding(format!(
                "expected {} pieces, got {}",
                self.num_pieces(),
                pieces.len()
            )));
        }

        let have = pieces.iter().filter(|p| p.is_some()).count();
        if have < self.data_pieces {
            return Err(StorageError::InsufficientPieces {
                have,
                need: self.data_pieces,
            });
        }

        match &self.rs {
            Some(rs) => rs.reconstruct_data(&mut pieces)?,
            None => {
                // Without parity every data piece must be present
                let have = pieces[..self.data_pieces].iter().filter(|p| p.is_some()).count();
                if have < self.data_pieces {
                    return Err(StorageError::InsufficientPieces {
                        have,
                        need: self.data_pieces,
                    });
                }
            }
        }

        let mut result = Vec::with_capacity(n);
        for piece in pieces.iter().take(self.data_pieces) {
            match piece {
                Some(piece) => result.extend_from_slice(piece),
                None => return Err(StorageError::ErasureCoding("reconstruction failed".into())),
            }
        }
        if result.len() < n {
            return Err(StorageError::ErasureCoding(format!(
                "requested {} bytes but pieces only hold {}",
                n,
                result.len()
            )));
        }
        result.truncate(n);
        Ok(result)
    }
}

/// Closed set of erasure coding algorithms a chunk can use
#[derive(Debug)]
pub enum ErasureCode {
    ReedSolomon(ReedSolomonCode),
}

impl ErasureCode {
    pub fn reed_solomon(data_pieces: usize, parity_pieces: usize) -> Result<Self, StorageError> {
        Ok(Self::ReedSolomon(ReedSolomonCode::new(
            data_pieces,
            parity_pieces,
        )?))
    }

    pub fn code_type(&self) -> ErasureCodeType {
        match self {
            Self::ReedSolomon(_) => ErasureCodeType::ReedSolomon,
        }
    }

    pub fn type_tag(&self) -> [u8; 4] {
        self.code_type().tag()
    }

    /// Encoded parameters: little-endian u32 data pieces, then little-endian
    /// u32 parity pieces
    pub fn params(&self) -> [u8; ERASURE_CODE_PARAMS_SIZE] {
        match self {
            Self::ReedSolomon(rs) => {
                let mut params = [0u8; ERASURE_CODE_PARAMS_SIZE];
                params[0..4].copy_from_slice(&(rs.data_pieces as u32).to_le_bytes());
                params[4..8].copy_from_slice(&(rs.parity_pieces as u32).to_le_bytes());
                params
            }
        }
    }

    /// Materialize a coder from its on-disk tag and parameters
    pub fn from_encoded(
        tag: [u8; 4],
        params: [u8; ERASURE_CODE_PARAMS_SIZE],
    ) -> Result<Self, StorageError> {
        match ErasureCodeType::from_tag(tag) {
            ErasureCodeType::ReedSolomon => {
                let data_pieces = u32::from_le_bytes([params[0], params[1], params[2], params[3]]);
                let parity_pieces =
                    u32::from_le_bytes([params[4], params[5], params[6], params[7]]);
                Self::reed_solomon(data_pieces as usize, parity_pieces as usize)
            }
            ErasureCodeType::Invalid => Err(StorageError::InvalidErasureCodeType(tag)),
        }
    }
}

impl ErasureCoder for ErasureCode {
    fn min_pieces(&self) -> usize {
        match self {
            Self::ReedSolomon(rs) => rs.min_pieces(),
        }
    }

    fn num_pieces(&self) -> usize {
        match self {
            Self::ReedSolomon(rs) => rs.num_pieces(),
        }
    }

    fn encode(&self, data: &[u8]) -> Result<Vec<Vec<u8>>, StorageError> {
        match self {
            Self::ReedSolomon(rs) => rs.encode(data),
        }
    }

    fn recover(&self, pieces: Vec<Option<Vec<u8>>>, n: usize) -> Result<Vec<u8>, StorageError> {
        match self {
            Self::ReedSolomon(rs) => rs.recover(pieces, n),
        }
    }
}
