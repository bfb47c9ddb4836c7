//! Read-only queries over the encoded gap sequence.
//!
//! Every query reconstructs primes through the codec; nothing here touches
//! the store or mutates state. Lookups past the first four primes decode
//! the full sequence — O(n), the cost of the no-random-access encoding.

use std::collections::HashSet;

use crate::codec::{self, SEED_PRIMES};
use crate::error::{PrimeDbError, Result};

/// Average actual gap over one block of the prime index range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapBlock {
    /// 1-based prime index where the block starts.
    pub start_index: u64,
    /// Mean of the actual (doubled) gaps whose upper prime falls in the block.
    pub average_gap: f64,
}

/// The nth prime (1-based).
///
/// `n <= 4` is answered from the seed without decoding. Past the end of
/// the database this is a recoverable `NotFound`, never fatal.
pub fn nth_prime(n: u64, gaps: &[u32]) -> Result<u64> {
    if n == 0 {
        return Err(PrimeDbError::NotFound { n, len: 0 });
    }
    if n as usize <= SEED_PRIMES.len() {
        return Ok(SEED_PRIMES[n as usize - 1]);
    }
    let primes = codec::decode(gaps);
    primes
        .get(n as usize - 1)
        .copied()
        .ok_or(PrimeDbError::NotFound {
            n,
            len: primes.len(),
        })
}

/// Block-averaged gap statistics.
///
/// The 1-based prime index range is partitioned into consecutive half-open
/// blocks `[i, i + block_size)`; the final partial block is included. Each
/// block averages the actual gaps `p[j] - p[j-1]` for every index `j` in
/// the block with `j >= 2` — so the gap crossing a block boundary (e.g.
/// 5 -> 7 into the block starting at prime #4) belongs to the block that
/// contains its upper prime. A block with no gap entries (only the first
/// block when `block_size == 1`) is omitted.
pub fn average_gap_per_block(block_size: usize, gaps: &[u32]) -> Vec<GapBlock> {
    let mut blocks = Vec::new();
    if block_size == 0 {
        return blocks;
    }
    let primes = codec::decode(gaps);
    let mut start = 1usize;
    while start <= primes.len() {
        let end = start.saturating_add(block_size).min(primes.len() + 1);
        let lo = start.max(2);
        if lo < end {
            let sum: u64 = (lo..end).map(|j| primes[j - 1] - primes[j - 2]).sum();
            let count = (end - lo) as f64;
            blocks.push(GapBlock {
                start_index: start as u64,
                average_gap: sum as f64 / count,
            });
        }
        start = start.saturating_add(block_size);
    }
    blocks
}

/// Membership set of all primes `<= limit`.
///
/// Used by the front end to test pixel presence when rendering a density
/// grid of side `s` (limit `s * s`).
pub fn density_below(limit: u64, gaps: &[u32]) -> HashSet<u64> {
    codec::decode(gaps)
        .into_iter()
        .take_while(|&p| p <= limit)
        .collect()
}
