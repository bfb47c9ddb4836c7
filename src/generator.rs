//! Incremental prime generation by trial division.
//!
//! A batch is the unit of work: a target count of new primes appended to
//! the sequence. Generation is deliberately single-threaded and CPU-bound;
//! single-writer discipline is enforced by `&mut` access to the sequences,
//! no internal locking.
//!
//! Write path: candidate -> trial division -> append (prime + gap in
//! lockstep) -> periodic checkpoint save every `save_interval` appends.
//!
//! Cancellation is cooperative: the token is polled once per candidate,
//! so the in-progress test always completes. On cancellation (and on
//! normal completion) a final checkpoint runs before returning — no
//! confirmed prime is ever left unpersisted across a cancel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::codec;
use crate::error::Result;
use crate::store::GapStore;

// ── Cancellation ─────────────────────────────────────────────────────

/// Shared flag for cooperative batch cancellation.
///
/// Cloneable; the CLI registers the inner flag with signal-hook so a
/// SIGINT mid-batch checkpoints and returns instead of killing progress.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Honored between candidate tests.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// The raw flag, for signal-hook registration.
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

// ── Batch Progress / Outcome ─────────────────────────────────────────

/// Incremental progress report, delivered once per appended prime.
#[derive(Debug, Clone, Copy)]
pub struct BatchProgress {
    /// Primes appended so far in this batch.
    pub appended: usize,
    /// Requested batch size.
    pub target: usize,
}

impl BatchProgress {
    /// Fraction of the batch completed, in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.target == 0 {
            1.0
        } else {
            self.appended as f64 / self.target as f64
        }
    }
}

/// Result of a batch run.
#[derive(Debug, Clone, Copy)]
pub struct BatchOutcome {
    /// Primes appended (equals the target unless cancelled).
    pub appended: usize,
    /// False if the batch was cancelled before reaching the target.
    pub completed: bool,
    /// Highest integer tested for primality. When the batch ends before
    /// any candidate is tested (zero target, or cancelled up front) this
    /// is the last known prime.
    pub highest_checked: u64,
}

// ── Trial Division ───────────────────────────────────────────────────

/// Test an odd candidate against the known primes.
///
/// Scans known primes from 3 upward and stops as soon as a prime exceeds
/// `isqrt(candidate)` — no further divisors are possible. The sequence is
/// extended one prime at a time, so the known primes always cover the
/// bound for the next candidate.
fn is_prime(candidate: u64, primes: &[u64]) -> bool {
    for &p in &primes[1..] {
        if p.saturating_mul(p) > candidate {
            break;
        }
        if candidate % p == 0 {
            return false;
        }
    }
    true
}

// ── Batch Runner ─────────────────────────────────────────────────────

/// Extend the sequence by up to `target_count` primes.
///
/// Starts at `last_known_prime + 2` (always odd: the seed ends at 7 and
/// every appended prime is odd). Appends each confirmed prime to `primes`
/// and `gaps` in lockstep, checkpointing the full gap sequence every
/// `save_interval` appends and once more at batch end.
///
/// A checkpoint I/O failure aborts the batch with the error; the
/// in-memory sequences keep everything appended so far.
pub(crate) fn run_batch(
    primes: &mut Vec<u64>,
    gaps: &mut Vec<u32>,
    store: &GapStore,
    target_count: usize,
    save_interval: usize,
    cancel: &CancelToken,
    mut progress: impl FnMut(BatchProgress),
) -> Result<BatchOutcome> {
    debug_assert_eq!(primes.len(), gaps.len());
    let save_interval = save_interval.max(1);

    let mut last = primes[primes.len() - 1];
    let mut candidate = last + 2;
    let mut appended = 0usize;
    let mut since_save = 0usize;
    let mut cancelled = false;

    while appended < target_count {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }
        if is_prime(candidate, primes) {
            gaps.push(codec::half_gap(last, candidate)?);
            primes.push(candidate);
            last = candidate;
            appended += 1;
            since_save += 1;
            progress(BatchProgress {
                appended,
                target: target_count,
            });
            if since_save >= save_interval {
                store.save(gaps)?;
                since_save = 0;
                tracing::debug!(
                    total = primes.len(),
                    highest = last,
                    "checkpoint saved"
                );
            }
        }
        candidate += 2;
    }

    // Final checkpoint covers both cancellation and normal completion.
    if since_save > 0 {
        store.save(gaps)?;
        tracing::debug!(total = primes.len(), highest = last, "final checkpoint saved");
    }

    Ok(BatchOutcome {
        appended,
        completed: !cancelled,
        highest_checked: candidate.saturating_sub(2),
    })
}
