//! PrimeDb — engine instance owning the gap sequence and its store.
//!
//! One explicit instance per database; every operation is a method, no
//! ambient global state. The engine keeps the gap sequence and the decoded
//! prime sequence in lockstep: gap index `i` always corresponds to prime
//! index `i`.
//!
//! Single-writer discipline: `run_batch` takes `&mut self`, so at most one
//! batch can run against an instance at a time — serialization of batch
//! requests is the caller's job.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::codec::{self, SEED_GAPS};
use crate::config::EngineConfig;
use crate::error::{PrimeDbError, Result};
use crate::generator::{self, BatchOutcome, BatchProgress, CancelToken};
use crate::query::{self, GapBlock};
use crate::store::{self, GapStore};

/// Read-only status snapshot for display.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStatus {
    /// Total primes in the database (seed included).
    pub prime_count: usize,
    /// Highest known prime.
    pub highest_prime: u64,
    /// Next odd candidate a batch would test.
    pub next_candidate: u64,
    /// Encoded database size in bytes.
    pub encoded_bytes: usize,
}

/// An open prime database.
pub struct PrimeDb {
    store: GapStore,
    config: EngineConfig,
    gaps: Vec<u32>,
    primes: Vec<u64>,
}

impl PrimeDb {
    /// Open a database at `path`, creating an empty (seed-only) one if no
    /// file exists. Engine config is read from `db_config.json` next to
    /// the database file, written with defaults on first open.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let config = match EngineConfig::read_from(&dir)? {
            Some(config) => config,
            None => {
                let config = EngineConfig::default();
                config.write_to(&dir)?;
                config
            }
        };

        let store = GapStore::new(path);
        let mut gaps = store.load()?;
        if gaps.is_empty() {
            // Missing database is not an error: fall back to the seed.
            gaps = SEED_GAPS.to_vec();
        } else if gaps.len() < SEED_GAPS.len() {
            return Err(PrimeDbError::InvalidFormat(format!(
                "database holds {} entries, smaller than the {}-entry seed",
                gaps.len(),
                SEED_GAPS.len()
            )));
        }
        let primes = codec::decode(&gaps);

        tracing::info!(
            path = %store.path().display(),
            primes = primes.len(),
            highest = primes[primes.len() - 1],
            "database opened"
        );

        Ok(Self {
            store,
            config,
            gaps,
            primes,
        })
    }

    // ── Status ───────────────────────────────────────────────────────

    pub fn prime_count(&self) -> usize {
        self.primes.len()
    }

    pub fn highest_known(&self) -> u64 {
        self.primes[self.primes.len() - 1]
    }

    /// The generation cursor is not persisted separately; it is always
    /// recomputed as `last prime + 2`.
    pub fn next_candidate(&self) -> u64 {
        self.highest_known() + 2
    }

    pub fn status(&self) -> DbStatus {
        DbStatus {
            prime_count: self.prime_count(),
            highest_prime: self.highest_known(),
            next_candidate: self.next_candidate(),
            encoded_bytes: self.gaps.len() * store::GAP_WIDTH,
        }
    }

    pub fn gaps(&self) -> &[u32] {
        &self.gaps
    }

    pub fn primes(&self) -> &[u64] {
        &self.primes
    }

    pub fn save_interval(&self) -> usize {
        self.config.save_interval
    }

    // ── Generation ───────────────────────────────────────────────────

    /// Run one generation batch: append up to `target_count` primes,
    /// checkpointing every `save_interval` appends and at batch end.
    ///
    /// On a checkpoint I/O failure the batch aborts with the error but
    /// the in-memory sequences keep all confirmed primes.
    pub fn run_batch(
        &mut self,
        target_count: usize,
        cancel: &CancelToken,
        progress: impl FnMut(BatchProgress),
    ) -> Result<BatchOutcome> {
        generator::run_batch(
            &mut self.primes,
            &mut self.gaps,
            &self.store,
            target_count,
            self.config.save_interval,
            cancel,
            progress,
        )
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn nth_prime(&self, n: u64) -> Result<u64> {
        query::nth_prime(n, &self.gaps)
    }

    pub fn average_gap_per_block(&self, block_size: usize) -> Vec<GapBlock> {
        query::average_gap_per_block(block_size, &self.gaps)
    }

    pub fn density_below(&self, limit: u64) -> HashSet<u64> {
        query::density_below(limit, &self.gaps)
    }

    // ── Shards / Admin ───────────────────────────────────────────────

    /// Replace the database with the ordered concatenation of shard
    /// blobs, persist, and return the new prime count.
    ///
    /// Malformed shards are skipped with a warning. Shard order is
    /// caller-enforced; merging out of order silently reconstructs a
    /// wrong sequence.
    pub fn merge_shards<B: AsRef<[u8]>>(&mut self, shards: &[B]) -> Result<usize> {
        let merged = store::merge(shards);
        self.replace_gaps(merged)?;
        Ok(self.primes.len())
    }

    /// Raw encoded bytes of the current in-memory sequence (admin
    /// download). Matches the canonical file after any checkpoint.
    pub fn export_raw(&self) -> Vec<u8> {
        store::encode_bytes(&self.gaps)
    }

    /// Replace the database with an uploaded raw blob (admin upload).
    /// The only validation is the element-width check.
    pub fn import_raw(&mut self, bytes: &[u8]) -> Result<usize> {
        let gaps = store::decode_bytes(bytes)?;
        self.replace_gaps(gaps)?;
        Ok(self.primes.len())
    }

    fn replace_gaps(&mut self, gaps: Vec<u32>) -> Result<()> {
        // Gap index i must line up with prime index i, so anything shorter
        // than the seed cannot be represented.
        if !gaps.is_empty() && gaps.len() < SEED_GAPS.len() {
            return Err(PrimeDbError::InvalidFormat(format!(
                "replacement holds {} entries, smaller than the {}-entry seed",
                gaps.len(),
                SEED_GAPS.len()
            )));
        }
        self.gaps = if gaps.is_empty() {
            SEED_GAPS.to_vec()
        } else {
            gaps
        };
        self.primes = codec::decode(&self.gaps);
        self.store.save(&self.gaps)?;
        Ok(())
    }
}
