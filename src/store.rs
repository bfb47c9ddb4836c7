//! On-disk storage for the encoded gap sequence.
//!
//! The canonical database is a single headerless file of little-endian
//! `u32` values: no checksum, no length prefix — the byte length alone
//! determines the element count (`size / 4`). A database may also exist
//! as ordered shard files (`<name>.shard-NNN`) next to the canonical
//! path; shards compose by concatenation in name-sort order.
//!
//! Checkpoints are full rewrites, made atomic by writing to a temporary
//! sibling and renaming over the canonical path. A failed write can never
//! leave the canonical file truncated.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::error::{PrimeDbError, Result};

/// Fixed element width of the on-disk format, in bytes.
pub const GAP_WIDTH: usize = 4;

/// Infix that marks a shard file belonging to a canonical path.
/// `primes.pgdb` owns `primes.pgdb.shard-000`, `primes.pgdb.shard-001`, ...
const SHARD_INFIX: &str = ".shard-";

/// Decode a raw byte blob into gap values.
///
/// Errors if the length is not a multiple of [`GAP_WIDTH`].
pub fn decode_bytes(data: &[u8]) -> Result<Vec<u32>> {
    if data.len() % GAP_WIDTH != 0 {
        return Err(PrimeDbError::InvalidFormat(format!(
            "byte length {} is not a multiple of {}",
            data.len(),
            GAP_WIDTH
        )));
    }
    Ok(data
        .chunks_exact(GAP_WIDTH)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Serialize gap values into the on-disk byte form.
pub fn encode_bytes(gaps: &[u32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(gaps.len() * GAP_WIDTH);
    for gap in gaps {
        out.extend_from_slice(&gap.to_le_bytes());
    }
    out
}

/// Merge shard byte blobs into one gap sequence by ordered concatenation.
///
/// A shard whose length is zero or not a multiple of [`GAP_WIDTH`] is
/// skipped with a warning, never fatal. No ordering or monotonicity
/// validation is performed — shard order is caller-enforced, and an
/// out-of-order merge silently reconstructs a wrong sequence.
pub fn merge<B: AsRef<[u8]>>(shards: &[B]) -> Vec<u32> {
    let mut gaps = Vec::new();
    for (idx, shard) in shards.iter().enumerate() {
        let bytes = shard.as_ref();
        if bytes.is_empty() || bytes.len() % GAP_WIDTH != 0 {
            tracing::warn!(
                shard = idx,
                len = bytes.len(),
                "skipping malformed shard (length not a multiple of {})",
                GAP_WIDTH
            );
            continue;
        }
        gaps.extend(
            bytes
                .chunks_exact(GAP_WIDTH)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]])),
        );
    }
    gaps
}

/// Owner of the canonical database file.
pub struct GapStore {
    path: PathBuf,
}

impl GapStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the gap sequence from disk.
    ///
    /// Resolution order: the canonical file if present, otherwise any
    /// shard files next to it (concatenated in name-sort order),
    /// otherwise an empty sequence. A missing database is not an error —
    /// callers fall back to the hard-coded seed.
    pub fn load(&self) -> Result<Vec<u32>> {
        if self.path.exists() {
            let file = File::open(&self.path)?;
            let mmap = unsafe { Mmap::map(&file) }?;
            return decode_bytes(&mmap);
        }
        let shards = self.shard_paths()?;
        if shards.is_empty() {
            return Ok(Vec::new());
        }
        let mut blobs = Vec::with_capacity(shards.len());
        for shard in &shards {
            blobs.push(fs::read(shard)?);
        }
        tracing::info!(count = shards.len(), "loading database from shard files");
        Ok(merge(&blobs))
    }

    /// Persist the full gap sequence atomically.
    ///
    /// Writes to a temporary sibling, fsyncs, then renames over the
    /// canonical path. Saving the same sequence twice produces
    /// byte-identical files.
    pub fn save(&self, gaps: &[u32]) -> Result<()> {
        let tmp = self.tmp_path();
        {
            let file = File::create(&tmp)?;
            let mut writer = BufWriter::new(file);
            for gap in gaps {
                writer.write_all(&gap.to_le_bytes())?;
            }
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Raw bytes of the canonical file (admin download pass-through).
    pub fn export_raw(&self) -> Result<Vec<u8>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        Ok(fs::read(&self.path)?)
    }

    /// Replace the canonical file with an uploaded blob (admin upload
    /// pass-through). The only validation is the element-width check.
    pub fn import_raw(&self, bytes: &[u8]) -> Result<Vec<u32>> {
        let gaps = decode_bytes(bytes)?;
        self.save(&gaps)?;
        Ok(gaps)
    }

    /// Shard files belonging to this canonical path, in name-sort order.
    fn shard_paths(&self) -> Result<Vec<PathBuf>> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let stem = match self.path.file_name().and_then(|n| n.to_str()) {
            Some(s) => format!("{s}{SHARD_INFIX}"),
            None => return Ok(Vec::new()),
        };
        let mut shards = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                if name.starts_with(&stem) {
                    shards.push(entry.path());
                }
            }
        }
        shards.sort();
        Ok(shards)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = GapStore::new(dir.path().join("primes.pgdb"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = GapStore::new(dir.path().join("primes.pgdb"));
        let gaps = vec![2, 1, 1, 1, 2, 1, 2];
        store.save(&gaps).unwrap();
        assert_eq!(store.load().unwrap(), gaps);
    }

    #[test]
    fn save_is_idempotent_byte_identical() {
        let dir = TempDir::new().unwrap();
        let store = GapStore::new(dir.path().join("primes.pgdb"));
        let gaps = vec![2, 1, 1, 1, 2];
        store.save(&gaps).unwrap();
        let first = fs::read(store.path()).unwrap();
        store.save(&gaps).unwrap();
        let second = fs::read(store.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn save_leaves_no_tmp_file() {
        let dir = TempDir::new().unwrap();
        let store = GapStore::new(dir.path().join("primes.pgdb"));
        store.save(&[2, 1, 1, 1]).unwrap();
        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["primes.pgdb".to_string()]);
    }

    #[test]
    fn load_concatenates_shards_in_name_order() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("primes.pgdb");
        // Written out of order on purpose; name sort must fix it up.
        fs::write(db.with_file_name("primes.pgdb.shard-001"), encode_bytes(&[2, 1])).unwrap();
        fs::write(
            db.with_file_name("primes.pgdb.shard-000"),
            encode_bytes(&[2, 1, 1, 1]),
        )
        .unwrap();
        let store = GapStore::new(&db);
        assert_eq!(store.load().unwrap(), vec![2, 1, 1, 1, 2, 1]);
    }

    #[test]
    fn canonical_file_wins_over_shards() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("primes.pgdb");
        fs::write(&db, encode_bytes(&[2, 1, 1, 1])).unwrap();
        fs::write(db.with_file_name("primes.pgdb.shard-000"), encode_bytes(&[9, 9])).unwrap();
        let store = GapStore::new(&db);
        assert_eq!(store.load().unwrap(), vec![2, 1, 1, 1]);
    }

    #[test]
    fn merge_skips_malformed_shards() {
        let a = encode_bytes(&[2, 1, 1, 1]);
        let bad = vec![0u8; 7]; // not a multiple of 4
        let empty: Vec<u8> = Vec::new();
        let b = encode_bytes(&[2, 1]);
        let merged = merge(&[a, bad, empty, b]);
        assert_eq!(merged, vec![2, 1, 1, 1, 2, 1]);
    }

    #[test]
    fn decode_bytes_rejects_ragged_length() {
        assert!(decode_bytes(&[0, 0, 0]).is_err());
        assert!(decode_bytes(&[]).unwrap().is_empty());
    }

    #[test]
    fn import_raw_validates_width() {
        let dir = TempDir::new().unwrap();
        let store = GapStore::new(dir.path().join("primes.pgdb"));
        assert!(store.import_raw(&[1, 2, 3]).is_err());
        assert!(!store.path().exists());

        let gaps = store.import_raw(&encode_bytes(&[2, 1, 1, 1, 3])).unwrap();
        assert_eq!(gaps, vec![2, 1, 1, 1, 3]);
        assert_eq!(store.load().unwrap(), gaps);
    }
}
