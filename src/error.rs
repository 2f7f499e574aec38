// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Hash chain broken at record index {index}")]
    ChainBroken { index: usize },

    #[error("Cannot build a Merkle tree from zero leaves")]
    EmptyTree,

    #[error("Ledger has no records, root is undefined")]
    EmptyLedger,

    #[error("Leaf index {index} out of range: tree has {leaf_count} leaves")]
    LeafOutOfRange { index: usize, leaf_count: usize },

    #[error("Peer {identity} is not initialized")]
    NotInitialized { identity: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
