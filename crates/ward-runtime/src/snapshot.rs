//! JSON persistence of the whole ward state.
//!
//! One file holds everything:
//!
//! ```text
//! ~/.ward/ward.json
//! {
//!   "version": 1,
//!   "saved_at": "...",
//!   "patients": [...], "visits": [...], "bills": [...],
//!   "rooms": [...],
//!   "audit": [...]
//! }
//! ```
//!
//! Writes go to a hidden temp file next to the target and are renamed
//! into place, so a crash mid-write leaves the previous file intact.
//!
//! A read-modify-write cycle across processes must hold [`SnapshotLock`]:
//!
//! ```text
//! lock (ward.json.lock, exclusive flock)
//!   ├─ load   ward.json
//!   ├─ run one operation
//!   └─ save   .ward.json.tmp → ward.json
//! unlock (drop)
//! ```

use crate::model::Room;
use crate::store::RecordSet;
use crate::{config::ConfigError, pool::PoolError, store::StoreError};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use thiserror::Error;
use ward_auth::AccessLogEntry;
use ward_types::ErrorCode;

/// Snapshot format version written by this build.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything needed to rebuild an [`Orchestrator`](crate::Orchestrator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WardSnapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    #[serde(flatten)]
    pub records: RecordSet,
    /// Rooms in allocation order. Empty means "seed from config".
    #[serde(default)]
    pub rooms: Vec<Room>,
    /// Audit entries, oldest first.
    #[serde(default)]
    pub audit: Vec<AccessLogEntry>,
}

impl WardSnapshot {
    #[must_use]
    pub fn new(records: RecordSet, rooms: Vec<Room>, audit: Vec<AccessLogEntry>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            records,
            rooms,
            audit,
        }
    }

    /// A snapshot with no records, rooms or audit entries.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(RecordSet::default(), Vec::new(), Vec::new())
    }
}

/// Errors while saving, loading or restoring a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// I/O error during file operations.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// File written by an incompatible build.
    #[error("version incompatible: file version {file_version}, supported {supported_version}")]
    VersionIncompatible {
        file_version: u32,
        supported_version: u32,
    },

    /// Stored records are inconsistent.
    #[error("invalid records: {0}")]
    Store(#[from] StoreError),

    /// Stored rooms are inconsistent.
    #[error("invalid rooms: {0}")]
    Pool(#[from] PoolError),

    /// The config needed to rebuild the orchestrator is invalid.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl SnapshotError {
    /// Creates an Io error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl ErrorCode for SnapshotError {
    fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "SNAPSHOT_IO",
            Self::Serialization(_) => "SNAPSHOT_SERIALIZATION",
            Self::VersionIncompatible { .. } => "SNAPSHOT_VERSION_INCOMPATIBLE",
            Self::Store(_) => "SNAPSHOT_INVALID_RECORDS",
            Self::Pool(_) => "SNAPSHOT_INVALID_ROOMS",
            Self::Config(_) => "SNAPSHOT_CONFIG",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

/// A snapshot file on disk.
///
/// # Example
///
/// ```
/// use ward_runtime::snapshot::{SnapshotFile, WardSnapshot};
///
/// let dir = tempfile::tempdir()?;
/// let file = SnapshotFile::new(dir.path().join("ward.json"));
/// assert!(file.load()?.is_none());
///
/// file.save(&WardSnapshot::empty())?;
/// assert!(file.load()?.is_some());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    /// Points at `path`, expanding a leading `~/`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: expand_tilde(&path.into()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sidecar file that [`lock`](Self::lock) holds, e.g. `ward.json.lock`.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.path.with_file_name(format!("{}.lock", self.file_name()))
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_file_name(format!(".{}.tmp", self.file_name()))
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| "ward.json".into(), |n| n.to_string_lossy().into_owned())
    }

    fn ensure_parent(&self) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| SnapshotError::io(parent, e))?;
        }
        Ok(())
    }

    /// Blocks until this process holds the exclusive lock on
    /// [`lock_path`](Self::lock_path), creating it if needed.
    ///
    /// The lock is advisory: only callers that take it are serialized.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Io`] if the lock file cannot be opened or
    /// locked.
    pub fn lock(&self) -> Result<SnapshotLock, SnapshotError> {
        self.ensure_parent()?;
        let path = self.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| SnapshotError::io(&path, e))?;
        FileExt::lock_exclusive(&file).map_err(|e| SnapshotError::io(&path, e))?;
        tracing::debug!(path = %path.display(), "snapshot lock acquired");
        Ok(SnapshotLock { file, path })
    }

    /// Reads the snapshot. `Ok(None)` if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] if the file cannot be read, is not valid
    /// JSON, or carries an unsupported version.
    pub fn load(&self) -> Result<Option<WardSnapshot>, SnapshotError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json =
            std::fs::read_to_string(&self.path).map_err(|e| SnapshotError::io(&self.path, e))?;
        let snapshot: WardSnapshot = serde_json::from_str(&json)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::VersionIncompatible {
                file_version: snapshot.version,
                supported_version: SNAPSHOT_VERSION,
            });
        }
        tracing::debug!(path = %self.path.display(), "snapshot loaded");
        Ok(Some(snapshot))
    }

    /// Writes the snapshot atomically, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] on serialization or I/O failure.
    pub fn save(&self, snapshot: &WardSnapshot) -> Result<(), SnapshotError> {
        self.ensure_parent()?;
        let json = serde_json::to_string_pretty(snapshot)?;
        let temp_path = self.temp_path();
        std::fs::write(&temp_path, json).map_err(|e| SnapshotError::io(&temp_path, e))?;
        std::fs::rename(&temp_path, &self.path).map_err(|e| SnapshotError::io(&self.path, e))?;
        tracing::debug!(path = %self.path.display(), "snapshot saved");
        Ok(())
    }
}

/// Exclusive hold on a snapshot's lock file. Released on drop.
#[derive(Debug)]
pub struct SnapshotLock {
    file: File,
    path: PathBuf,
}

impl SnapshotLock {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SnapshotLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to release snapshot lock"
            );
        }
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(rest) = path.to_str().and_then(|s| s.strip_prefix("~/")) {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_none() {
        let dir = TempDir::new().expect("tempdir");
        let file = SnapshotFile::new(dir.path().join("absent.json"));
        assert!(file.load().expect("load").is_none());
    }

    #[test]
    fn save_creates_parents_and_leaves_no_temp() {
        let dir = TempDir::new().expect("tempdir");
        let file = SnapshotFile::new(dir.path().join("nested").join("ward.json"));
        let snapshot = WardSnapshot::new(
            RecordSet::default(),
            vec![Room::free("101", "Dr. Mehta")],
            Vec::new(),
        );
        file.save(&snapshot).expect("save");

        let loaded = file.load().expect("load").expect("present");
        assert_eq!(loaded, snapshot);
        assert!(!dir.path().join("nested").join(".ward.json.tmp").exists());
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let file = SnapshotFile::new(dir.path().join("ward.json"));
        let mut snapshot = WardSnapshot::empty();
        snapshot.version = 99;
        file.save(&snapshot).expect("save");
        assert!(matches!(
            file.load(),
            Err(SnapshotError::VersionIncompatible { file_version: 99, .. })
        ));
    }

    #[test]
    fn corrupt_file_is_a_serialization_error() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("ward.json");
        std::fs::write(&path, "{ not json").expect("write");
        assert!(matches!(
            SnapshotFile::new(path).load(),
            Err(SnapshotError::Serialization(_))
        ));
    }

    #[test]
    fn lock_creates_sidecar_and_parents() {
        let dir = TempDir::new().expect("tempdir");
        let file = SnapshotFile::new(dir.path().join("data").join("ward.json"));
        let lock = file.lock().expect("lock");
        assert_eq!(lock.path(), dir.path().join("data").join("ward.json.lock"));
        assert!(file.lock_path().exists());
        assert!(!file.path().exists());
    }

    #[test]
    fn lock_excludes_other_holders_until_dropped() {
        let dir = TempDir::new().expect("tempdir");
        let file = SnapshotFile::new(dir.path().join("ward.json"));
        let lock = file.lock().expect("lock");

        let other = OpenOptions::new()
            .write(true)
            .open(file.lock_path())
            .expect("open lock file");
        assert!(FileExt::try_lock_exclusive(&other).is_err());

        drop(lock);
        assert!(FileExt::try_lock_exclusive(&other).is_ok());
    }

    #[test]
    fn tilde_is_expanded() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(SnapshotFile::new("~/w.json").path(), home.join("w.json"));
        }
    }
}
