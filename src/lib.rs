//! Renter Core - erasure-coded file tracking for decentralized storage
//!
//! This crate tracks how a file is split into erasure-coded chunks, which
//! storage hosts hold which pieces of each chunk, and whether enough pieces
//! are currently reachable to reconstruct the file. Networking, contract
//! management and persistence live outside and drive it through `SiaFile`.

pub mod crypto;
pub mod identity;
pub mod storage;

pub use crypto::{ContentHash, MasterKey};
pub use identity::{HostPublicKey, Specifier};
pub use storage::{
    ErasureCode, ErasureCoder, HostStatusMap, Piece, RedundancyReport, SiaFile, StorageError,
};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Main error type for renter core operations
#[derive(Error, Debug)]
pub enum RenterError {
    #[error("Cryptographic error: {0}")]
    Crypto(#[from] crypto::CryptoError),

    #[error("Identity error: {0}")]
    Identity(#[from] identity::IdentityError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<serde_json::Error> for RenterError {
    fn from(err: serde_json::Error) -> Self {
        RenterError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RenterError>;

/// Upload parameters applied to new files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenterConfig {
    /// Pieces needed to recover a chunk
    pub data_pieces: usize,

    /// Extra redundant pieces per chunk
    pub parity_pieces: usize,

    /// Bytes per piece
    pub piece_size: u64,
}

impl Default for RenterConfig {
    fn default() -> Self {
        // 10-of-30: any 10 pieces recover a chunk, 3x overhead
        Self {
            data_pieces: 10,
            parity_pieces: 20,
            piece_size: 4 * 1024 * 1024, // 4 MiB
        }
    }
}

impl RenterConfig {
    /// Parse a JSON config; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.data_pieces == 0 {
            return Err(RenterError::Configuration("data_pieces must be > 0".into()));
        }
        if self.piece_size == 0 {
            return Err(RenterError::Configuration("piece_size must be > 0".into()));
        }
        if self
            .data_pieces
            .checked_add(self.parity_pieces)
            .filter(|total| *total <= 256)
            .is_none()
        {
            return Err(RenterError::Configuration(format!(
                "at most 256 pieces per chunk, got {} data + {} parity",
                self.data_pieces, self.parity_pieces
            )));
        }
        if self.piece_size.checked_mul(self.data_pieces as u64).is_none() {
            return Err(RenterError::Configuration(format!(
                "chunk size overflows: {} pieces of {} bytes",
                self.data_pieces, self.piece_size
            )));
        }
        Ok(())
    }

    /// Payload bytes per chunk. Only meaningful for a validated config.
    pub fn chunk_size(&self) -> u64 {
        self.piece_size.saturating_mul(self.data_pieces as u64)
    }

    /// Chunks needed for a file of `file_size` bytes (at least one)
    pub fn num_chunks(&self, file_size: u64) -> u64 {
        file_size.div_ceil(self.chunk_size()).max(1)
    }

    pub fn erasure_code(&self) -> Result<ErasureCode> {
        Ok(ErasureCode::reed_solomon(self.data_pieces, self.parity_pieces)?)
    }

    /// Create a file whose chunks all use this config's erasure code
    pub fn new_file(
        &self,
        sia_path: impl Into<String>,
        file_size: u64,
        mode: u32,
        source: impl Into<PathBuf>,
    ) -> Result<SiaFile> {
        self.validate()?;
        let code = Arc::new(self.erasure_code()?);
        let chunks = vec![code; self.num_chunks(file_size) as usize];
        Ok(SiaFile::new(
            sia_path,
            chunks,
            self.piece_size,
            file_size,
            mode,
            source,
        )?)
    }
}

/// Install a fmt subscriber for `tracing` output.
///
/// `filter` uses `EnvFilter` syntax; `None` reads `RUST_LOG` and falls back
/// to `info`. Does nothing if a global subscriber is already set.
pub fn init_tracing(filter: Option<&str>) {
    use tracing_subscriber::EnvFilter;

    let filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RenterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_size(), 40 * 1024 * 1024);
        assert_eq!(config.num_chunks(0), 1);
        assert_eq!(config.num_chunks(config.chunk_size()), 1);
        assert_eq!(config.num_chunks(config.chunk_size() + 1), 2);
    }

    #[test]
    fn test_config_json() {
        let config =
            RenterConfig::from_json(r#"{ "data_pieces": 4, "parity_pieces": 2 }"#).unwrap();
        assert_eq!(config.data_pieces, 4);
        assert_eq!(config.parity_pieces, 2);
        assert_eq!(config.piece_size, RenterConfig::default().piece_size);

        let json = config.to_json().unwrap();
        assert_eq!(RenterConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_config_rejects_invalid() {
        assert!(matches!(
            RenterConfig::from_json(r#"{ "data_pieces": 0 }"#),
            Err(RenterError::Configuration(_))
        ));
        assert!(matches!(
            RenterConfig::from_json(r#"{ "data_pieces": 200, "parity_pieces": 100 }"#),
            Err(RenterError::Configuration(_))
        ));
        assert!(matches!(
            RenterConfig::from_json(r#"{ "parity_pieces": 18446744073709551615 }"#),
            Err(RenterError::Configuration(_))
        ));
        assert!(matches!(
            RenterConfig::from_json(r#"{ "data_pieces": 4, "piece_size": 9223372036854775807 }"#),
            Err(RenterError::Configuration(_))
        ));
        assert!(matches!(
            RenterConfig::from_json("not json"),
            Err(RenterError::Serialization(_))
        ));
    }

    #[test]
    fn test_new_file_from_config() {
        init_tracing(Some("debug"));
        let config = RenterConfig {
            data_pieces: 2,
            parity_pieces: 1,
            piece_size: 64,
        };
        let file = config
            .new_file("docs/report.pdf", 300, 0o644, "/home/user/report.pdf")
            .unwrap();

        // 128 bytes per chunk
        assert_eq!(file.num_chunks(), 3);
        assert_eq!(file.pieces(2).len(), 3);
        assert_eq!(file.chunk_index_by_offset(299), (2, 43));
    }
}
