// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Network-level divergence analysis.
//!
//! The network never owns peers; it holds shared handles in first-seen
//! order and reads point-in-time snapshots (identity, record count,
//! root). Comparison and grouping run on snapshot data, so no two peer
//! locks are ever held at once and peer pairs stay fully independent.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::hash::Digest;
use crate::peer::{Comparison, Peer};
use crate::store::RecordStore;

/// Shared handle to a peer. Callers that append from several threads
/// lock per operation; the mutex serializes writers per ledger.
pub type SharedPeer<S> = Arc<Mutex<Peer<S>>>;

/// Aggregate view of how far the network has diverged.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthReport {
    pub total: usize,
    pub largest_group: usize,
    /// Share of peers inside the largest sync group, 0–100.
    pub sync_percentage: f64,
    /// True iff every peer shares one root.
    pub healthy: bool,
}

struct PeerSnapshot {
    identity: String,
    record_count: usize,
    root: Option<Digest>,
}

pub struct Network<S: RecordStore> {
    peers: Vec<SharedPeer<S>>,
}

impl<S: RecordStore> Default for Network<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: RecordStore> Network<S> {
    pub fn new() -> Self {
        Self { peers: Vec::new() }
    }

    pub fn add_peer(&mut self, peer: SharedPeer<S>) {
        self.peers.push(peer);
    }

    /// Drop the peer with the given identity. Returns whether one was
    /// removed.
    pub fn remove_peer(&mut self, identity: &str) -> bool {
        let before = self.peers.len();
        self.peers.retain(|peer| {
            let guard = peer.lock().unwrap_or_else(|e| e.into_inner());
            guard.identity() != identity
        });
        self.peers.len() != before
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Compare every unordered pair of peers (all C(n,2) of them).
    ///
    /// Keys are identity pairs, lexicographically smaller first; the
    /// comparison is oriented the same way.
    pub fn pairwise_compare(&self) -> Result<BTreeMap<(String, String), Comparison>> {
        let snapshots = self.snapshots()?;
        let mut out = BTreeMap::new();
        for i in 0..snapshots.len() {
            for j in (i + 1)..snapshots.len() {
                let (a, b) = if snapshots[i].identity <= snapshots[j].identity {
                    (&snapshots[i], &snapshots[j])
                } else {
                    (&snapshots[j], &snapshots[i])
                };
                let comparison =
                    Comparison::evaluate(a.record_count, a.root, b.record_count, b.root);
                if !comparison.identical {
                    tracing::warn!(
                        left = %a.identity,
                        right = %b.identity,
                        divergence = %comparison.divergence,
                        "divergence detected"
                    );
                }
                out.insert((a.identity.clone(), b.identity.clone()), comparison);
            }
        }
        Ok(out)
    }

    /// Partition peers into same-root equivalence classes.
    ///
    /// Root equality is already an equivalence relation, so one pass
    /// of group-by-digest is enough. Groups keep first-seen leader
    /// order, members keep first-seen order. Peers with empty ledgers
    /// share one class (identical by convention).
    pub fn sync_groups(&self) -> Result<Vec<Vec<String>>> {
        let snapshots = self.snapshots()?;
        let mut groups: Vec<(Option<Digest>, Vec<String>)> = Vec::new();
        for snapshot in snapshots {
            match groups.iter().position(|(root, _)| *root == snapshot.root) {
                Some(i) => groups[i].1.push(snapshot.identity),
                None => groups.push((snapshot.root, vec![snapshot.identity])),
            }
        }
        Ok(groups.into_iter().map(|(_, members)| members).collect())
    }

    pub fn health_report(&self) -> Result<HealthReport> {
        let groups = self.sync_groups()?;
        let total = self.peers.len();
        let largest_group = groups.iter().map(Vec::len).max().unwrap_or(0);
        let sync_percentage = if total == 0 {
            0.0
        } else {
            largest_group as f64 / total as f64 * 100.0
        };
        let healthy = groups.len() == 1;
        if !healthy {
            tracing::debug!(groups = groups.len(), total, "network not fully in sync");
        }
        Ok(HealthReport {
            total,
            largest_group,
            sync_percentage,
            healthy,
        })
    }

    /// Lock one peer at a time and copy out identity, count and root.
    fn snapshots(&self) -> Result<Vec<PeerSnapshot>> {
        let mut out = Vec::with_capacity(self.peers.len());
        for peer in &self.peers {
            let mut guard = peer.lock().unwrap_or_else(|e| e.into_inner());
            let record_count = guard.record_count()?;
            let root = if record_count > 0 {
                Some(guard.get_root()?)
            } else {
                None
            };
            out.push(PeerSnapshot {
                identity: guard.identity().to_string(),
                record_count,
                root,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peer::Divergence;
    use crate::store::MemoryStore;

    fn shared_peer(identity: &str, events: &[&str]) -> SharedPeer<MemoryStore> {
        let mut peer = Peer::new(identity, MemoryStore::new());
        peer.initialize().unwrap();
        for event in events {
            peer.add_event(event.as_bytes()).unwrap();
        }
        Arc::new(Mutex::new(peer))
    }

    const EVENTS: [&str; 3] = ["login alice", "transfer 100", "logout alice"];

    fn diverged_network() -> Network<MemoryStore> {
        let mut network = Network::new();
        network.add_peer(shared_peer("node-a", &EVENTS));
        network.add_peer(shared_peer("node-b", &EVENTS));
        network.add_peer(shared_peer(
            "node-c",
            &["login alice", "transfer 100", "cache cleared"],
        ));
        network
    }

    #[test]
    fn test_pairwise_compare_covers_all_pairs() {
        let network = diverged_network();
        let comparisons = network.pairwise_compare().unwrap();
        assert_eq!(comparisons.len(), 3);

        let ab = &comparisons[&("node-a".to_string(), "node-b".to_string())];
        assert!(ab.identical);

        let ac = &comparisons[&("node-a".to_string(), "node-c".to_string())];
        assert!(!ac.identical);
        assert_eq!(ac.divergence, Divergence::ContentMismatch);
    }

    #[test]
    fn test_sync_groups_partition_by_root() {
        let network = diverged_network();
        let groups = network.sync_groups().unwrap();
        assert_eq!(
            groups,
            vec![
                vec!["node-a".to_string(), "node-b".to_string()],
                vec!["node-c".to_string()]
            ]
        );
    }

    #[test]
    fn test_health_report_on_diverged_network() {
        let network = diverged_network();
        let report = network.health_report().unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.largest_group, 2);
        assert!(!report.healthy);
        assert_eq!((report.sync_percentage * 10.0).round() / 10.0, 66.7);
    }

    #[test]
    fn test_health_report_on_synced_network() {
        let mut network = Network::new();
        network.add_peer(shared_peer("node-a", &EVENTS));
        network.add_peer(shared_peer("node-b", &EVENTS));
        let report = network.health_report().unwrap();
        assert!(report.healthy);
        assert_eq!(report.sync_percentage, 100.0);
    }

    #[test]
    fn test_empty_peers_group_together() {
        let mut network = Network::new();
        network.add_peer(shared_peer("node-a", &[]));
        network.add_peer(shared_peer("node-b", &[]));
        let groups = network.sync_groups().unwrap();
        assert_eq!(
            groups,
            vec![vec!["node-a".to_string(), "node-b".to_string()]]
        );
        assert!(network.health_report().unwrap().healthy);
    }

    #[test]
    fn test_remove_peer() {
        let mut network = diverged_network();
        assert!(network.remove_peer("node-c"));
        assert!(!network.remove_peer("node-c"));
        assert_eq!(network.peer_count(), 2);
        assert!(network.health_report().unwrap().healthy);
    }

    #[test]
    fn test_empty_network_health() {
        let network: Network<MemoryStore> = Network::new();
        let report = network.health_report().unwrap();
        assert_eq!(report.total, 0);
        assert_eq!(report.sync_percentage, 0.0);
        assert!(!report.healthy);
    }
}
