//! PGDB — append-only prime gap database engine.
//!
//! Primes are stored as half-gaps in a headerless file of little-endian
//! `u32` values. The engine extends the database by trial division in
//! bounded batches with periodic checkpoint saves, merges ordered shard
//! files, and answers read-only queries (nth prime, block-averaged gap
//! statistics, density membership sets) over the reconstructed sequence.
//!
//! Data flow:
//!
//! ```text
//! GapStore -> bytes -> codec::decode -> primes
//!   -> generator::run_batch (extends in place)
//!   -> GapStore::save (checkpoint)
//! query::* reads the same reconstructed sequence, never the store.
//! ```

pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod query;
pub mod store;

pub use config::EngineConfig;
pub use engine::{DbStatus, PrimeDb};
pub use error::{PrimeDbError, Result};
pub use generator::{BatchOutcome, BatchProgress, CancelToken};
pub use query::GapBlock;
pub use store::GapStore;
