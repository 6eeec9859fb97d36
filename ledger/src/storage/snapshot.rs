//! # Chain Snapshots
//!
//! A snapshot is the whole chain as one JSON document: format version, chain
//! id, hash algorithm, seal state and every record.
//!
//! ## Atomicity
//!
//! [`ChainSnapshot::save`] writes to a sibling `*.tmp` file, flushes it to
//! disk, then renames it over the target. Readers see either the old file or
//! the new one, never a torn write.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::record::Record;
use crate::config::SNAPSHOT_FORMAT_VERSION;
use crate::crypto::HashAlgorithm;
use crate::error::{LedgerError, LedgerResult};

/// Serializable image of a [`Chain`](super::Chain).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub format_version: u32,
    pub chain_id: Uuid,
    pub algorithm: HashAlgorithm,
    pub sealed: bool,
    pub records: Vec<Record>,
}

impl ChainSnapshot {
    /// Write the snapshot to `path` as pretty-printed JSON, replacing any
    /// existing file atomically. Parent directories are created as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> LedgerResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = temp_path_for(path);
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, self)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp_path, path)?;

        debug!(
            path = %path.display(),
            records = self.records.len(),
            sealed = self.sealed,
            "snapshot saved"
        );
        Ok(())
    }

    /// Read a snapshot from `path`.
    ///
    /// Only decodes and checks the format version; record hashes are checked
    /// when the snapshot is turned back into a chain.
    pub fn load<P: AsRef<Path>>(path: P) -> LedgerResult<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let snapshot: ChainSnapshot = serde_json::from_reader(reader)?;

        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(LedgerError::UnsupportedSnapshotVersion(
                snapshot.format_version,
            ));
        }

        debug!(
            path = %path.display(),
            records = snapshot.records.len(),
            "snapshot loaded"
        );
        Ok(snapshot)
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Chain;
    use serde_json::json;

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        let mut chain = Chain::new();
        chain.append(json!({"a": 1})).unwrap();
        let snapshot = chain.snapshot();
        snapshot.save(&path).unwrap();

        let loaded = ChainSnapshot::load(&path).unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn save_creates_parent_directories_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("ledger.json");

        Chain::new().snapshot().save(&path).unwrap();

        assert!(path.exists());
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn save_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        let mut chain = Chain::new();
        chain.snapshot().save(&path).unwrap();
        chain.append(json!("second")).unwrap();
        chain.snapshot().save(&path).unwrap();

        assert_eq!(ChainSnapshot::load(&path).unwrap().records.len(), 2);
    }

    #[test]
    fn load_rejects_unknown_format_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        let mut snapshot = Chain::new().snapshot();
        snapshot.format_version = 7;
        snapshot.save(&path).unwrap();

        assert!(matches!(
            ChainSnapshot::load(&path),
            Err(LedgerError::UnsupportedSnapshotVersion(7))
        ));
    }

    #[test]
    fn load_reports_missing_file_and_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            ChainSnapshot::load(&missing),
            Err(LedgerError::Io(_))
        ));

        let garbage = dir.path().join("garbage.json");
        fs::write(&garbage, b"{not json").unwrap();
        assert!(matches!(
            ChainSnapshot::load(&garbage),
            Err(LedgerError::Serialization(_))
        ));
    }

    #[test]
    fn temp_path_is_a_sibling() {
        let tmp = temp_path_for(Path::new("/var/lib/ledger.json"));
        assert_eq!(tmp, PathBuf::from("/var/lib/ledger.json.tmp"));
    }
}
