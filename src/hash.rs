// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! BLAKE3 hashing primitives.
//!
//! Every digest in the system comes from here: record hashes, Merkle
//! leaves, pairwise combination.
//!
//! # Guarantee
//! Same input → same digest (across any architecture)

/// 32-byte BLAKE3 digest.
pub type Digest = [u8; 32];

/// `prev_hash` of the first record in every ledger.
pub const GENESIS: Digest = [0u8; 32];

/// Hash a byte slice.
pub fn hash_bytes(data: &[u8]) -> Digest {
    *blake3::hash(data).as_bytes()
}

/// Combine two digests into their parent digest.
///
/// Concatenation order is left-then-right. Swapping the operands
/// yields a different digest; that asymmetry is what keeps sibling
/// order inside Merkle proofs honest.
pub fn combine(left: &Digest, right: &Digest) -> Digest {
    let mut hasher = blake3::Hasher::new();
    hasher.update(left);
    hasher.update(right);
    *hasher.finalize().as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        assert_eq!(hash_bytes(b"record1"), hash_bytes(b"record1"));
        assert_ne!(hash_bytes(b"record1"), hash_bytes(b"record2"));
    }

    #[test]
    fn test_combine_order_matters() {
        let a = hash_bytes(b"left");
        let b = hash_bytes(b"right");
        assert_ne!(combine(&a, &b), combine(&b, &a));
    }

    #[test]
    fn test_combine_matches_concatenation() {
        let a = hash_bytes(b"left");
        let b = hash_bytes(b"right");
        let mut concat = Vec::with_capacity(64);
        concat.extend_from_slice(&a);
        concat.extend_from_slice(&b);
        assert_eq!(combine(&a, &b), hash_bytes(&concat));
    }
}
