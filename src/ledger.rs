// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Append-only record ledger.
//!
//! # Durability rule
//! Records reach the storage collaborator BEFORE the in-memory view is
//! extended. A crash between the two leaves the store ahead of memory,
//! never behind; reopening replays the store and the views reconverge.
//!
//! # Writer discipline
//! One logical writer per ledger. `append` takes `&mut self`, so the
//! borrow checker serializes id assignment, chain linking and
//! persistence; readers never observe a half-appended record.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::hash::{Digest, GENESIS};
use crate::record::Record;
use crate::store::RecordStore;

pub struct Ledger<S: RecordStore> {
    store: S,
    records: Vec<Record>,
    config: LedgerConfig,
    last_timestamp: u64,
}

impl<S: RecordStore> Ledger<S> {
    /// Open a ledger over a collaborator, replaying any records it
    /// already holds and verifying the hash chain along the way.
    pub fn open(store: S, config: LedgerConfig) -> Result<Self> {
        let records = {
            let iter = store.iter()?;
            iter.collect::<std::result::Result<Vec<_>, _>>()?
        };
        verify_records(&records)?;

        let last_timestamp = records.last().map(|r| r.created_at).unwrap_or(0);
        if !records.is_empty() {
            tracing::debug!(count = records.len(), "ledger replayed from store");
        }

        Ok(Self {
            store,
            records,
            config,
            last_timestamp,
        })
    }

    /// Validate, chain, persist and remember one new record.
    pub fn append(&mut self, payload: &[u8]) -> Result<Record> {
        if payload.is_empty() {
            return Err(LedgerError::InvalidPayload("payload is empty".into()));
        }
        if payload.len() > self.config.max_payload_bytes {
            return Err(LedgerError::InvalidPayload(format!(
                "payload is {} bytes, limit is {}",
                payload.len(),
                self.config.max_payload_bytes
            )));
        }

        let id = self.records.len() as u64 + 1;
        let created_at = self.next_timestamp();
        let prev_hash = self.records.last().map(|r| r.hash).unwrap_or(GENESIS);
        let record = Record::create(id, payload.to_vec(), created_at, prev_hash);

        self.store.persist(&record)?;
        self.records.push(record.clone());
        tracing::debug!(id, "record appended");

        Ok(record)
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Every record, in insertion order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Leaf digests in insertion order, the exact Merkle tree input.
    /// Swapping two records changes the leaf sequence and the root.
    pub fn leaf_hashes(&self) -> Vec<Digest> {
        self.records.iter().map(Record::leaf_hash).collect()
    }

    /// Re-walk the chain, recomputing each record hash and checking
    /// each `prev_hash` link. Fails fast at the first break.
    pub fn verify_chain(&self) -> Result<()> {
        verify_records(&self.records)
    }

    /// Hand the storage collaborator back, consuming the ledger.
    pub fn into_store(self) -> S {
        self.store
    }

    fn next_timestamp(&mut self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0);
        // Clamp so the sequence stays non-decreasing if the wall clock
        // steps backwards.
        let ts = now.max(self.last_timestamp);
        self.last_timestamp = ts;
        ts
    }
}

fn verify_records(records: &[Record]) -> Result<()> {
    for (index, record) in records.iter().enumerate() {
        let expected_prev = if index == 0 {
            GENESIS
        } else {
            records[index - 1].hash
        };
        let id_ok = record.id == index as u64 + 1;
        if !id_ok || record.prev_hash != expected_prev || !record.verify_hash() {
            tracing::warn!(index, "hash chain break detected");
            return Err(LedgerError::ChainBroken { index });
        }
    }
    Ok(())
}
