//! Proof-of-work puzzle.
//!
//! A candidate proof `q` is admissible after a block with proof `p` when
//! `sha256(decimal(q² - p²))` starts with `difficulty` zero hex digits.
//!
//! The puzzle only looks at the difference of squares, so it is far weaker
//! than hashing the proofs together: solutions can sometimes be derived
//! algebraically. It is kept as-is because peers validate with the same rule;
//! raising `difficulty` is the only knob.

use crate::constants::{HASH_HEX_SIZE, POW_DEFAULT_DIFFICULTY, POW_SEARCH_BATCH};
use crate::hash::sha256_hex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofOfWork {
    difficulty: usize,
}

impl Default for ProofOfWork {
    fn default() -> Self {
        Self {
            difficulty: POW_DEFAULT_DIFFICULTY,
        }
    }
}

impl ProofOfWork {
    /// `difficulty` is clamped to the digest length.
    pub fn new(difficulty: usize) -> Self {
        Self {
            difficulty: difficulty.min(HASH_HEX_SIZE),
        }
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn verify(&self, candidate: i64, previous: i64) -> bool {
        count_leading_zero_hex(&puzzle_hash(candidate, previous)) >= self.difficulty
    }

    /// Smallest positive proof that satisfies the puzzle against `previous`.
    ///
    /// Candidates are scanned in fixed batches; each batch is searched in
    /// parallel with `find_first`, so the result is the same as a plain
    /// `1, 2, 3, ...` scan. Runs until a proof is found.
    pub fn solve(&self, previous: i64) -> i64 {
        let mut start = 1i64;
        loop {
            let end = start.saturating_add(POW_SEARCH_BATCH);
            if let Some(found) = (start..end)
                .into_par_iter()
                .find_first(|candidate| self.verify(*candidate, previous))
            {
                debug!(previous, proof = found, "proof of work solved");
                return found;
            }
            // i64::MAX is never reached in practice; wrap rather than spin.
            start = if end == i64::MAX { 1 } else { end };
        }
    }
}

/// Hex digest the difficulty predicate inspects.
pub fn puzzle_hash(candidate: i64, previous: i64) -> String {
    let candidate = i128::from(candidate);
    let previous = i128::from(previous);
    let operation = candidate * candidate - previous * previous;
    sha256_hex(operation.to_string().as_bytes())
}

pub fn count_leading_zero_hex(hash: &str) -> usize {
    hash.chars().take_while(|c| *c == '0').count()
}

/// `ProofOfWork::default().solve(previous)`.
pub fn solve(previous: i64) -> i64 {
    ProofOfWork::default().solve(previous)
}

/// `ProofOfWork::default().verify(candidate, previous)`.
pub fn verify(candidate: i64, previous: i64) -> bool {
    ProofOfWork::default().verify(candidate, previous)
}
