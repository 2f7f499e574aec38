// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Immutable hash-chained records.
//!
//! A record is never updated or deleted. Its `hash` covers id,
//! payload, timestamp and the previous record's hash, which links
//! every ledger into a tamper-evident chain.
//!
//! # Hash preimages
//! Fields are length-framed little-endian, so no two distinct records
//! share a preimage. The Merkle leaf digest covers id and payload
//! only: timestamps and chain hashes stay out, so replicas that
//! appended the same payloads in the same order agree on every leaf,
//! and therefore on the root.

use serde::{Deserialize, Serialize};

use crate::hash::Digest;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    /// Ledger-local, gap-free, starts at 1.
    pub id: u64,
    pub payload: Vec<u8>,
    /// Microsecond Unix timestamp, non-decreasing within a ledger.
    pub created_at: u64,
    /// Hash of the previous record, or [`crate::hash::GENESIS`].
    pub prev_hash: Digest,
    /// `H(id, payload, created_at, prev_hash)`.
    pub hash: Digest,
}

impl Record {
    pub(crate) fn create(id: u64, payload: Vec<u8>, created_at: u64, prev_hash: Digest) -> Self {
        let hash = Self::chain_hash(id, &payload, created_at, &prev_hash);
        Self {
            id,
            payload,
            created_at,
            prev_hash,
            hash,
        }
    }

    /// Hash covering the full record contents plus the chain link.
    pub fn chain_hash(id: u64, payload: &[u8], created_at: u64, prev_hash: &Digest) -> Digest {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&id.to_le_bytes());
        hasher.update(&(payload.len() as u32).to_le_bytes());
        hasher.update(payload);
        hasher.update(&created_at.to_le_bytes());
        hasher.update(prev_hash);
        *hasher.finalize().as_bytes()
    }

    /// Merkle leaf digest for this record.
    pub fn leaf_hash(&self) -> Digest {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.id.to_le_bytes());
        hasher.update(&(self.payload.len() as u32).to_le_bytes());
        hasher.update(&self.payload);
        *hasher.finalize().as_bytes()
    }

    /// Recompute this record's hash and check it against the stored one.
    pub fn verify_hash(&self) -> bool {
        self.hash == Self::chain_hash(self.id, &self.payload, self.created_at, &self.prev_hash)
    }
}
