//! A ledger over a file-backed store must survive reopen with its
//! chain intact and its root unchanged.

use tempfile::tempdir;

use tessera::config::LedgerConfig;
use tessera::ledger::Ledger;
use tessera::peer::Peer;
use tessera_persistence::LogStore;

#[test]
fn test_ledger_reopen_preserves_chain_and_root() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("alice.log");

    let root_before = {
        let store = LogStore::open(&path).unwrap();
        let mut peer = Peer::new("alice", store);
        peer.initialize().unwrap();
        peer.add_event(b"User login: alice@example.com").unwrap();
        peer.add_event(b"Transaction: $100 transfer to bob").unwrap();
        peer.add_event(b"System event: backup completed").unwrap();
        peer.get_root().unwrap()
    };

    let store = LogStore::open(&path).unwrap();
    let mut peer = Peer::new("alice", store);
    peer.initialize().unwrap();

    assert_eq!(peer.record_count().unwrap(), 3);
    peer.verify_chain().unwrap();
    assert_eq!(peer.get_root().unwrap(), root_before);
}

#[test]
fn test_reopened_ledger_continues_the_chain() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ledger.log");

    {
        let store = LogStore::open(&path).unwrap();
        let mut ledger = Ledger::open(store, LedgerConfig::default()).unwrap();
        ledger.append(b"first").unwrap();
        ledger.append(b"second").unwrap();
    }

    let store = LogStore::open(&path).unwrap();
    let mut ledger = Ledger::open(store, LedgerConfig::default()).unwrap();
    let third = ledger.append(b"third").unwrap();

    assert_eq!(third.id, 3);
    assert_eq!(third.prev_hash, ledger.records()[1].hash);
    ledger.verify_chain().unwrap();
}

#[test]
fn test_tampered_log_fails_to_open() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ledger.log");

    {
        let store = LogStore::open(&path).unwrap();
        let mut ledger = Ledger::open(store, LedgerConfig::default()).unwrap();
        ledger.append(b"before tamper").unwrap();
    }

    // Flip one byte somewhere inside the first entry's payload.
    let mut bytes = std::fs::read(&path).unwrap();
    let offset = bytes.len() - 4;
    bytes[offset] ^= 0xFF;
    std::fs::write(&path, &bytes).unwrap();

    let store = LogStore::open(&path).unwrap();
    assert!(Ledger::open(store, LedgerConfig::default()).is_err());
}
