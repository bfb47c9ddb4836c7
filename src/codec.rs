//! Half-gap codec for prime sequences.
//!
//! The database stores primes as half-gaps: entry `i` holds
//! `(p[i] - p[i-1]) / 2`, exploiting that every gap between odd primes is
//! even. The first four primes `[2, 3, 5, 7]` are never derived from stored
//! data — they occupy fixed placeholder entries so that gap index `i` always
//! lines up with prime index `i`.
//!
//! ## Stored layout (logical)
//!
//! ```text
//! index 0: 2   first prime value, kept as a sentinel
//! index 1: 1   gap 2 -> 3 (not halved; 2 is the only even prime)
//! index 2: 1   half-gap 3 -> 5
//! index 3: 1   half-gap 5 -> 7
//! index 4+: (p[i] - p[i-1]) / 2
//! ```
//!
//! Decoding is a linear scan with no random access: nth-prime lookup for
//! large `n` costs O(n).

use crate::error::{PrimeDbError, Result};

/// The first four primes. Single source of truth for every place that
/// special-cases the seed (codec, query layer, generator restart).
pub const SEED_PRIMES: [u64; 4] = [2, 3, 5, 7];

/// Stored form of the seed. Entry 0 is the first prime value itself;
/// the values are placeholders and are never read back by `decode`.
pub const SEED_GAPS: [u32; 4] = [2, 1, 1, 1];

/// Compute the stored half-gap for one appended prime.
///
/// Both `prev` and `next` must be odd (holds for all primes above 2), so
/// their difference is even. Errors on a non-increasing pair, an odd
/// difference, or a half-gap that does not fit in 32 bits.
pub fn half_gap(prev: u64, next: u64) -> Result<u32> {
    if next <= prev {
        return Err(PrimeDbError::InvalidSequence(format!(
            "non-increasing pair {prev} -> {next}"
        )));
    }
    let diff = next - prev;
    if diff % 2 != 0 {
        return Err(PrimeDbError::InvalidSequence(format!(
            "odd gap {diff} between {prev} and {next}; both values must be odd"
        )));
    }
    u32::try_from(diff / 2).map_err(|_| PrimeDbError::GapOverflow { prev, next })
}

/// Encode a full prime sequence into its stored gap form.
///
/// The input must start with the seed `[2, 3, 5, 7]` and be strictly
/// increasing with even differences above the seed.
pub fn encode(primes: &[u64]) -> Result<Vec<u32>> {
    if primes.len() < SEED_PRIMES.len() || primes[..SEED_PRIMES.len()] != SEED_PRIMES {
        return Err(PrimeDbError::InvalidSequence(
            "sequence must start with 2, 3, 5, 7".to_string(),
        ));
    }
    let mut gaps = SEED_GAPS.to_vec();
    for i in SEED_PRIMES.len()..primes.len() {
        gaps.push(half_gap(primes[i - 1], primes[i])?);
    }
    Ok(gaps)
}

/// Decode a stored gap sequence back into primes.
///
/// Always seeds with `[2, 3, 5, 7]`; the stored seed entries are skipped,
/// every later entry adds `2 * gap` to the running value. An empty (or
/// seed-only) input decodes to exactly the seed.
pub fn decode(gaps: &[u32]) -> Vec<u64> {
    let mut primes = Vec::with_capacity(gaps.len().max(SEED_PRIMES.len()));
    primes.extend_from_slice(&SEED_PRIMES);
    let mut last = SEED_PRIMES[SEED_PRIMES.len() - 1];
    for &gap in gaps.iter().skip(SEED_GAPS.len()) {
        last += 2 * gap as u64;
        primes.push(last);
    }
    primes
}
