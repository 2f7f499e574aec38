// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

/// Default cap on a single record payload (64 KiB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 64 * 1024;

/// Ledger configuration, passed explicitly into construction.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Maximum accepted payload size in bytes.
    pub max_payload_bytes: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}
