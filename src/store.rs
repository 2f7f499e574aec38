// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Storage collaborator interface.
//!
//! The core never touches files. It hands records to a [`RecordStore`]
//! and reads them back in insertion order; encoding, checksums and
//! fsync policy all belong to the collaborator. Failures are typed and
//! propagated, never swallowed.

use thiserror::Error;

use crate::record::Record;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Corrupt store: {0}")]
    Corrupt(String),
}

/// Records streamed back from a store, in insertion order.
pub type RecordIter<'a> = Box<dyn Iterator<Item = std::result::Result<Record, StoreError>> + 'a>;

pub trait RecordStore {
    /// Durably append one record.
    ///
    /// Must not return `Ok` until the record would survive a crash.
    fn persist(&mut self, record: &Record) -> std::result::Result<(), StoreError>;

    /// Stream every persisted record in insertion order.
    fn iter(&self) -> std::result::Result<RecordIter<'_>, StoreError>;
}

/// In-process store backed by a `Vec`.
///
/// Zero-setup collaborator for tests and in-memory peers.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: Vec<Record>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Overwrite the payload of a stored record, leaving its hash
    /// untouched. Tamper-simulation hook for integrity tests.
    pub fn corrupt_payload(&mut self, index: usize, payload: Vec<u8>) {
        self.records[index].payload = payload;
    }
}

impl RecordStore for MemoryStore {
    fn persist(&mut self, record: &Record) -> std::result::Result<(), StoreError> {
        self.records.push(record.clone());
        Ok(())
    }

    fn iter(&self) -> std::result::Result<RecordIter<'_>, StoreError> {
        Ok(Box::new(self.records.iter().cloned().map(Ok)))
    }
}
