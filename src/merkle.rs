// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Binary Merkle tree over an ordered leaf sequence.
//!
//! # Construction
//! Level 0 is the leaf digests exactly as given; the tree never
//! re-hashes a leaf. Each parent is `combine(left, right)`. A level
//! with an odd node count pairs its last node with itself
//! (duplicate-promote, never a synthetic zero hash). Every replica
//! must use the same rule or roots stop being comparable.
//!
//! # Determinism
//! Same leaf sequence → same root, on any machine. Nothing here reads
//! clocks or iterates unordered containers.

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::hash::{combine, Digest};

/// Operand position the sibling digest takes in `combine`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

/// One step of an inclusion proof, ordered leaf-to-root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    pub sibling: Digest,
    pub side: Side,
}

/// Owned tree node. Leaves have no children. The graph is a tree, not
/// a DAG: a duplicate-promoted node owns a clone of its pair.
#[derive(Debug, Clone)]
pub struct MerkleNode {
    hash: Digest,
    left: Option<Box<MerkleNode>>,
    right: Option<Box<MerkleNode>>,
}

impl MerkleNode {
    fn leaf(hash: Digest) -> Self {
        Self {
            hash,
            left: None,
            right: None,
        }
    }

    fn parent(left: MerkleNode, right: MerkleNode) -> Self {
        let hash = combine(&left.hash, &right.hash);
        Self {
            hash,
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
        }
    }

    pub fn hash(&self) -> &Digest {
        &self.hash
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    pub fn children(&self) -> (Option<&MerkleNode>, Option<&MerkleNode>) {
        (self.left.as_deref(), self.right.as_deref())
    }
}

/// Immutable once built; an appended leaf means a rebuild.
pub struct MerkleTree {
    root: MerkleNode,
    leaves: Vec<Digest>,
}

impl MerkleTree {
    /// Build a tree from pre-hashed leaves.
    pub fn build(leaves: &[Digest]) -> Result<Self> {
        if leaves.is_empty() {
            return Err(LedgerError::EmptyTree);
        }

        let mut level: Vec<MerkleNode> = leaves.iter().copied().map(MerkleNode::leaf).collect();
        while level.len() > 1 {
            let mut next = Vec::with_capacity((level.len() + 1) / 2);
            let mut nodes = level.into_iter();
            while let Some(left) = nodes.next() {
                let right = nodes.next().unwrap_or_else(|| left.clone());
                next.push(MerkleNode::parent(left, right));
            }
            level = next;
        }
        let root = level.pop().ok_or(LedgerError::EmptyTree)?;

        Ok(Self {
            root,
            leaves: leaves.to_vec(),
        })
    }

    /// The single fingerprint of the whole leaf sequence.
    pub fn root(&self) -> Digest {
        self.root.hash
    }

    pub fn root_node(&self) -> &MerkleNode {
        &self.root
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Inclusion proof for the leaf at `index`, ordered leaf-to-root.
    ///
    /// A lone last node at any level proves against itself (the
    /// duplicate-promote pair), with the sibling on the right.
    pub fn proof(&self, index: usize) -> Result<Vec<ProofStep>> {
        if index >= self.leaves.len() {
            return Err(LedgerError::LeafOutOfRange {
                index,
                leaf_count: self.leaves.len(),
            });
        }

        let mut steps = Vec::new();
        let mut level = self.leaves.clone();
        let mut idx = index;
        while level.len() > 1 {
            let step = if idx % 2 == 0 {
                let sibling = if idx + 1 < level.len() {
                    level[idx + 1]
                } else {
                    level[idx]
                };
                ProofStep {
                    sibling,
                    side: Side::Right,
                }
            } else {
                ProofStep {
                    sibling: level[idx - 1],
                    side: Side::Left,
                }
            };
            steps.push(step);
            level = next_level(&level);
            idx /= 2;
        }
        Ok(steps)
    }

    /// Recompute a root from one leaf and a proof, and compare.
    ///
    /// Pure: takes no tree instance, so it can check a remote peer's
    /// claim without rebuilding their tree. Each step's declared side
    /// is cross-checked against the index parity at that level; a
    /// proof with inconsistent sides never verifies.
    pub fn verify(
        leaf: &Digest,
        index: usize,
        proof: &[ProofStep],
        expected_root: &Digest,
    ) -> bool {
        let mut acc = *leaf;
        let mut idx = index;
        for step in proof {
            let expected_side = if idx % 2 == 0 { Side::Right } else { Side::Left };
            if step.side != expected_side {
                return false;
            }
            acc = match step.side {
                Side::Left => combine(&step.sibling, &acc),
                Side::Right => combine(&acc, &step.sibling),
            };
            idx /= 2;
        }
        acc == *expected_root
    }
}

fn next_level(level: &[Digest]) -> Vec<Digest> {
    level
        .chunks(2)
        .map(|pair| {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            combine(left, right)
        })
        .collect()
}
