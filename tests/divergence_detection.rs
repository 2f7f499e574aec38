//! End-to-end divergence scenarios across in-process peers.

use std::sync::{Arc, Mutex};

use tessera::merkle::MerkleTree;
use tessera::network::Network;
use tessera::peer::{Divergence, Peer};
use tessera::store::MemoryStore;

const EVENTS: [&str; 2] = [
    "User login: alice@example.com",
    "Transaction: $100 transfer to bob",
];

fn peer_with_events(identity: &str, events: &[&str]) -> Peer<MemoryStore> {
    let mut peer = Peer::new(identity, MemoryStore::new());
    peer.initialize().unwrap();
    for event in events {
        peer.add_event(event.as_bytes()).unwrap();
    }
    peer
}

#[test]
fn test_identical_histories_share_a_root() {
    let mut alice = peer_with_events("alice", &EVENTS);
    let mut bob = peer_with_events("bob", &EVENTS);

    let comparison = alice.compare(&mut bob).unwrap();
    assert!(comparison.identical);
    assert_eq!(comparison.self_count, 2);
    assert_eq!(comparison.other_count, 2);
    assert_eq!(comparison.divergence, Divergence::None);
    assert_eq!(alice.get_root().unwrap(), bob.get_root().unwrap());
}

#[test]
fn test_swapped_order_is_content_divergence() {
    let mut alice = peer_with_events("alice", &EVENTS);
    let mut carol = peer_with_events("carol", &[EVENTS[1], EVENTS[0]]);

    let comparison = alice.compare(&mut carol).unwrap();
    assert!(!comparison.identical);
    assert_eq!(comparison.self_count, comparison.other_count);
    assert_eq!(comparison.divergence, Divergence::ContentMismatch);
}

#[test]
fn test_sync_groups_and_health_on_three_peer_network() {
    let mut network = Network::new();
    for identity in ["node-a", "node-b"] {
        let peer = peer_with_events(
            identity,
            &["login alice", "transfer 100", "backup completed"],
        );
        network.add_peer(Arc::new(Mutex::new(peer)));
    }
    let diverged = peer_with_events(
        "node-c",
        &["login alice", "transfer 100", "cache cleared"],
    );
    network.add_peer(Arc::new(Mutex::new(diverged)));

    let groups = network.sync_groups().unwrap();
    assert_eq!(
        groups,
        vec![
            vec!["node-a".to_string(), "node-b".to_string()],
            vec!["node-c".to_string()]
        ]
    );

    let report = network.health_report().unwrap();
    assert_eq!(report.total, 3);
    assert_eq!(report.largest_group, 2);
    assert!(!report.healthy);
    assert_eq!((report.sync_percentage * 10.0).round() / 10.0, 66.7);
}

#[test]
fn test_proof_validates_remote_claim_without_remote_tree() {
    // Alice proves her second record; Bob checks the claim against his
    // own root, never touching Alice's tree.
    let mut alice = peer_with_events("alice", &EVENTS);
    let mut bob = peer_with_events("bob", &EVENTS);

    let proof = alice.proof(1).unwrap();
    let leaf = alice.leaf_hashes().unwrap()[1];
    let bob_root = bob.get_root().unwrap();
    assert!(MerkleTree::verify(&leaf, 1, &proof, &bob_root));
}

#[test]
fn test_tampered_record_breaks_chain_but_not_silently() {
    let mut store = MemoryStore::new();
    {
        let mut peer = Peer::new("alice", store.clone());
        peer.initialize().unwrap();
        for event in EVENTS {
            peer.add_event(event.as_bytes()).unwrap();
        }
        // Keep the records the peer persisted.
        store = peer.into_store().unwrap();
    }

    store.corrupt_payload(1, b"Transaction: $9999 transfer to mallory".to_vec());

    let mut tampered = Peer::new("alice", store);
    let err = tampered.initialize().unwrap_err();
    assert!(matches!(
        err,
        tessera::error::LedgerError::ChainBroken { index: 1 }
    ));
    assert_eq!(tampered.status(), tessera::peer::PeerStatus::Errored);
}
