//! File-backed storage collaborator for tessera ledgers.
//!
//! One append-only log file per ledger: a small magic/version header
//! followed by checksummed, bincode-encoded record entries.

pub mod error;
pub mod log;

pub use error::{PersistenceError, Result};
pub use log::LogStore;
