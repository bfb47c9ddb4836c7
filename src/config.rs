//! Persistent engine configuration.
//!
//! Written once when a database is created, next to the database file as
//! `db_config.json`. Read on every open.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default number of appended primes between checkpoint saves.
pub const DEFAULT_SAVE_INTERVAL: usize = 1_000;

const CONFIG_FILE: &str = "db_config.json";

/// Persistent engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    /// Checkpoint every this many newly appended primes. A crash mid-batch
    /// loses at most `save_interval - 1` primes of progress.
    pub save_interval: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            save_interval: DEFAULT_SAVE_INTERVAL,
        }
    }
}

impl EngineConfig {
    /// Read config from the database directory. Returns None if the file
    /// doesn't exist.
    pub fn read_from(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        let config: Self = serde_json::from_str(&contents)?;
        Ok(Some(config))
    }

    /// Write config to the database directory.
    pub fn write_to(&self, dir: &Path) -> Result<()> {
        let path = dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn read_missing_returns_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(EngineConfig::read_from(dir.path()).unwrap(), None);
    }

    #[test]
    fn write_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig { save_interval: 250 };
        config.write_to(dir.path()).unwrap();
        assert_eq!(
            EngineConfig::read_from(dir.path()).unwrap(),
            Some(config)
        );
    }
}
