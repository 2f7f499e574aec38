// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Peer: one identity, one owned ledger, one cached fingerprint.
//!
//! The cached Merkle tree follows a dirty-flag protocol: appends mark
//! it stale, the next root or proof request rebuilds it. Bulk appends
//! therefore cost one rebuild, not one per record.

use std::fmt;

use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::hash::Digest;
use crate::ledger::Ledger;
use crate::merkle::{MerkleTree, ProofStep};
use crate::record::Record;
use crate::store::RecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerStatus {
    Uninitialized,
    Active,
    Errored,
}

/// How two peers' histories relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Divergence {
    None,
    CountMismatch,
    ContentMismatch,
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Divergence::None => write!(f, "none"),
            Divergence::CountMismatch => write!(f, "record count mismatch"),
            // Root comparison alone cannot localize the first
            // differing record.
            Divergence::ContentMismatch => write!(f, "content mismatch at unknown offset"),
        }
    }
}

/// Result of comparing two peers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub identical: bool,
    pub self_count: usize,
    pub other_count: usize,
    pub divergence: Divergence,
}

impl Comparison {
    /// Pure comparison over snapshotted counts and roots.
    ///
    /// An empty ledger has no root (`None`); two empty peers compare
    /// identical by convention.
    pub fn evaluate(
        self_count: usize,
        self_root: Option<Digest>,
        other_count: usize,
        other_root: Option<Digest>,
    ) -> Self {
        if self_count != other_count {
            return Self {
                identical: false,
                self_count,
                other_count,
                divergence: Divergence::CountMismatch,
            };
        }
        let identical = self_root == other_root;
        Self {
            identical,
            self_count,
            other_count,
            divergence: if identical {
                Divergence::None
            } else {
                Divergence::ContentMismatch
            },
        }
    }
}

/// Point-in-time view of one peer, for status displays.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub identity: String,
    pub status: PeerStatus,
    pub record_count: usize,
    pub root: Option<Digest>,
    /// Payloads of the most recent records, oldest first.
    pub latest_payloads: Vec<Vec<u8>>,
}

pub struct Peer<S: RecordStore> {
    identity: String,
    config: LedgerConfig,
    store: Option<S>,
    ledger: Option<Ledger<S>>,
    tree: Option<MerkleTree>,
    dirty: bool,
    status: PeerStatus,
}

impl<S: RecordStore> Peer<S> {
    pub fn new(identity: impl Into<String>, store: S) -> Self {
        Self::with_config(identity, store, LedgerConfig::default())
    }

    pub fn with_config(identity: impl Into<String>, store: S, config: LedgerConfig) -> Self {
        Self {
            identity: identity.into(),
            config,
            store: Some(store),
            ledger: None,
            tree: None,
            dirty: false,
            status: PeerStatus::Uninitialized,
        }
    }

    /// Open the ledger, replaying whatever the collaborator already
    /// holds. Idempotent once active.
    pub fn initialize(&mut self) -> Result<()> {
        if self.status == PeerStatus::Active {
            return Ok(());
        }
        let store = self.store.take().ok_or_else(|| LedgerError::NotInitialized {
            identity: self.identity.clone(),
        })?;
        match Ledger::open(store, self.config.clone()) {
            Ok(ledger) => {
                self.ledger = Some(ledger);
                self.dirty = true;
                self.status = PeerStatus::Active;
                Ok(())
            }
            Err(e) => {
                self.status = PeerStatus::Errored;
                tracing::warn!(identity = %self.identity, error = %e, "peer initialization failed");
                Err(e)
            }
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn status(&self) -> PeerStatus {
        self.status
    }

    /// Append one event to this peer's ledger and mark the cached
    /// tree stale.
    pub fn add_event(&mut self, payload: &[u8]) -> Result<Record> {
        let identity = self.identity.clone();
        let ledger = self
            .ledger
            .as_mut()
            .ok_or(LedgerError::NotInitialized { identity })?;
        let record = ledger.append(payload)?;
        self.dirty = true;
        Ok(record)
    }

    pub fn record_count(&self) -> Result<usize> {
        Ok(self.ledger()?.record_count())
    }

    /// Every record in this peer's ledger, in insertion order.
    pub fn records(&self) -> Result<&[Record]> {
        Ok(self.ledger()?.records())
    }

    /// Leaf digests in insertion order, the Merkle tree input.
    pub fn leaf_hashes(&self) -> Result<Vec<Digest>> {
        Ok(self.ledger()?.leaf_hashes())
    }

    /// Current Merkle root, rebuilding the cached tree if stale.
    ///
    /// Zero records have no root: that is an explicit error, not a
    /// sentinel digest.
    pub fn get_root(&mut self) -> Result<Digest> {
        let ledger = self.ledger.as_ref().ok_or(LedgerError::NotInitialized {
            identity: self.identity.clone(),
        })?;
        if ledger.record_count() == 0 {
            return Err(LedgerError::EmptyLedger);
        }

        let stale_leaves = if self.dirty || self.tree.is_none() {
            Some(ledger.leaf_hashes())
        } else {
            None
        };
        if let Some(leaves) = stale_leaves {
            tracing::debug!(identity = %self.identity, leaves = leaves.len(), "rebuilding merkle tree");
            self.tree = Some(MerkleTree::build(&leaves)?);
            self.dirty = false;
        }

        match self.tree.as_ref() {
            Some(tree) => Ok(tree.root()),
            None => Err(LedgerError::EmptyLedger),
        }
    }

    /// Inclusion proof for the record at `index` in this peer's tree.
    pub fn proof(&mut self, index: usize) -> Result<Vec<ProofStep>> {
        self.get_root()?;
        match self.tree.as_ref() {
            Some(tree) => tree.proof(index),
            None => Err(LedgerError::EmptyLedger),
        }
    }

    /// Re-verify this peer's local hash chain.
    pub fn verify_chain(&self) -> Result<()> {
        self.ledger()?.verify_chain()
    }

    /// Compare this peer's history against another's.
    pub fn compare(&mut self, other: &mut Peer<S>) -> Result<Comparison> {
        let self_count = self.record_count()?;
        let other_count = other.record_count()?;
        let self_root = if self_count > 0 {
            Some(self.get_root()?)
        } else {
            None
        };
        let other_root = if other_count > 0 {
            Some(other.get_root()?)
        } else {
            None
        };
        let comparison = Comparison::evaluate(self_count, self_root, other_count, other_root);
        if !comparison.identical {
            tracing::warn!(
                left = %self.identity,
                right = %other.identity,
                divergence = %comparison.divergence,
                "divergence detected"
            );
        }
        Ok(comparison)
    }

    pub fn status_report(&mut self) -> StatusReport {
        let (record_count, latest_payloads) = match self.ledger.as_ref() {
            Some(ledger) => {
                let records = ledger.records();
                let tail = records.len().saturating_sub(3);
                (
                    records.len(),
                    records[tail..].iter().map(|r| r.payload.clone()).collect(),
                )
            }
            None => (0, Vec::new()),
        };
        StatusReport {
            identity: self.identity.clone(),
            status: self.status,
            record_count,
            root: self.get_root().ok(),
            latest_payloads,
        }
    }

    /// Hand the storage collaborator back, consuming the peer.
    pub fn into_store(self) -> Option<S> {
        match self.ledger {
            Some(ledger) => Some(ledger.into_store()),
            None => self.store,
        }
    }

    fn ledger(&self) -> Result<&Ledger<S>> {
        self.ledger.as_ref().ok_or(LedgerError::NotInitialized {
            identity: self.identity.clone(),
        })
    }
}
