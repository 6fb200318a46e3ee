//! Merkle trees over transaction records.
//!
//! Leaves are structured-record digests of each transaction. A parent is the
//! SHA-256 of its children's hex digests concatenated as text (no
//! separator). An odd level duplicates its last digest on the right.

use crate::crypto::Sha256Hash;
use crate::types::{MerkleRoot, Transaction};

/// Compute the Merkle root of an ordered transaction sequence.
///
/// An empty sequence has no root and yields [`MerkleRoot::Empty`].
pub fn merkle_root(transactions: &[Transaction]) -> MerkleRoot {
    let leaves: Vec<Sha256Hash> = transactions.iter().map(Transaction::digest).collect();
    root_from_leaves(&leaves)
}

/// Reduce leaf digests to a root.
pub fn root_from_leaves(leaves: &[Sha256Hash]) -> MerkleRoot {
    if leaves.is_empty() {
        return MerkleRoot::Empty;
    }

    let mut level = leaves.to_vec();
    while level.len() > 1 {
        level = next_level(&level);
    }
    MerkleRoot::Root(level[0])
}

/// Hash two sibling digests into their parent.
pub fn hash_pair(left: &Sha256Hash, right: &Sha256Hash) -> Sha256Hash {
    let mut text = String::with_capacity(128);
    text.push_str(&left.to_hex());
    text.push_str(&right.to_hex());
    Sha256Hash::hash_text(&text)
}

fn next_level(level: &[Sha256Hash]) -> Vec<Sha256Hash> {
    level
        .chunks(2)
        .map(|pair| {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            hash_pair(left, right)
        })
        .collect()
}

/// Which side of the running digest a sibling sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// One step of a Merkle path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofStep {
    pub side: Side,
    pub digest: Sha256Hash,
}

/// Membership proof for one leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    /// Position of the leaf in the original sequence.
    pub leaf_index: usize,
    /// Siblings from the leaf level up to just below the root.
    pub path: Vec<ProofStep>,
}

impl MerkleProof {
    /// Recompute the root from `leaf` along this path.
    pub fn compute_root(&self, leaf: &Sha256Hash) -> Sha256Hash {
        self.path.iter().fold(*leaf, |acc, step| match step.side {
            Side::Left => hash_pair(&step.digest, &acc),
            Side::Right => hash_pair(&acc, &step.digest),
        })
    }

    /// Check that `leaf` sits at `leaf_index` under `root`.
    ///
    /// The sides along the path must agree with the bits of `leaf_index`, so a
    /// valid path cannot be replayed for a different position.
    pub fn verify(&self, leaf: &Sha256Hash, root: &MerkleRoot) -> bool {
        let Some(expected) = root.digest() else {
            return false;
        };

        let mut position = self.leaf_index;
        for step in &self.path {
            let expected_side = if position % 2 == 0 { Side::Right } else { Side::Left };
            if step.side != expected_side {
                return false;
            }
            position /= 2;
        }
        if position != 0 {
            return false;
        }

        self.compute_root(leaf) == *expected
    }

    /// Check that `transaction` sits at `leaf_index` under `root`.
    pub fn verify_transaction(&self, transaction: &Transaction, root: &MerkleRoot) -> bool {
        self.verify(&transaction.digest(), root)
    }
}

/// A Merkle tree that keeps every level, for producing proofs.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    /// `levels[0]` are the leaves; the last level holds the root.
    levels: Vec<Vec<Sha256Hash>>,
}

impl MerkleTree {
    /// Build the tree for a transaction sequence.
    pub fn build(transactions: &[Transaction]) -> Self {
        let leaves = transactions.iter().map(Transaction::digest).collect();
        Self::from_leaves(leaves)
    }

    pub fn from_leaves(leaves: Vec<Sha256Hash>) -> Self {
        let mut levels = vec![leaves];
        while levels.last().map_or(false, |level| level.len() > 1) {
            let next = next_level(&levels[levels.len() - 1]);
            levels.push(next);
        }
        Self { levels }
    }

    pub fn root(&self) -> MerkleRoot {
        match self.levels.last().and_then(|level| level.first()) {
            Some(root) => MerkleRoot::Root(*root),
            None => MerkleRoot::Empty,
        }
    }

    pub fn leaves(&self) -> &[Sha256Hash] {
        &self.levels[0]
    }

    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Number of levels including leaves and root.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Produce the membership proof for a leaf.
    ///
    /// A node without a right neighbour was paired with itself, so its
    /// sibling in the proof is its own digest.
    pub fn proof(&self, leaf_index: usize) -> Option<MerkleProof> {
        if leaf_index >= self.leaf_count() {
            return None;
        }

        let mut path = Vec::with_capacity(self.levels.len().saturating_sub(1));
        let mut position = leaf_index;
        for level in &self.levels[..self.levels.len() - 1] {
            let step = if position % 2 == 0 {
                let sibling = level.get(position + 1).unwrap_or(&level[position]);
                ProofStep {
                    side: Side::Right,
                    digest: *sibling,
                }
            } else {
                ProofStep {
                    side: Side::Left,
                    digest: level[position - 1],
                }
            };
            path.push(step);
            position /= 2;
        }

        Some(MerkleProof { leaf_index, path })
    }
}

/// Locate the transactions that differ between two sequences.
///
/// Leaves are compared position by position; when the lengths differ, every
/// position past the end of the shorter sequence is reported as well.
pub fn diff_leaves(original: &[Transaction], candidate: &[Transaction]) -> Vec<usize> {
    let longest = original.len().max(candidate.len());
    (0..longest)
        .filter(|&i| match (original.get(i), candidate.get(i)) {
            (Some(a), Some(b)) => a.digest() != b.digest(),
            _ => true,
        })
        .collect()
}
