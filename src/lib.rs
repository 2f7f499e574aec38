// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! tessera: a content-addressed, append-only record ledger with Merkle
//! tree fingerprints and multi-peer divergence detection.
//!
//! Each record is hash-chained to its predecessor; a Merkle tree over
//! the ledger's leaf hashes gives every peer a single fingerprint, and
//! the network layer partitions peers into consistency classes from
//! pairwise root comparison. Divergence is detected, never reconciled.

pub mod config;
pub mod error;
pub mod hash;
pub mod ledger;
pub mod merkle;
pub mod network;
pub mod peer;
pub mod record;
pub mod store;

pub use config::LedgerConfig;
pub use error::{LedgerError, Result};
pub use ledger::Ledger;
pub use merkle::MerkleTree;
pub use network::Network;
pub use peer::Peer;
pub use record::Record;
