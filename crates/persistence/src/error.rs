use std::io;
use thiserror::Error;

use tessera::store::StoreError;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Invalid magic bytes in header")]
    InvalidMagic,

    #[error("Unsupported log version {0}")]
    UnsupportedVersion(u32),

    #[error("Checksum mismatch: expected {expected}, found {found}")]
    ChecksumMismatch { expected: u64, found: u64 },

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

impl From<PersistenceError> for StoreError {
    fn from(e: PersistenceError) -> Self {
        match e {
            PersistenceError::IoError(io) => StoreError::IoError(io),
            other => StoreError::Corrupt(other.to_string()),
        }
    }
}
