#![forbid(unsafe_code)]

//! Local persistence of the layout set.
//!
//! A session saves a [`LayoutSetSnapshot`] after every applied mutation and
//! loads it back at start. Schema migration is the store's job; storage only
//! moves snapshots in and out.
//!
//! # Atomic writes
//!
//! [`FileStorage`] writes pretty JSON to `<path>.tmp` and renames it over the
//! target, so a crash mid-write leaves the previous snapshot intact.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use onyx_layout::LayoutSetSnapshot;

/// Errors from a storage backend.
#[derive(Debug)]
pub enum StorageError {
    Io(io::Error),
    /// The stored document is not a layout set.
    Corrupt(serde_json::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "storage I/O error: {e}"),
            Self::Corrupt(e) => write!(f, "stored layout set is corrupt: {e}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Corrupt(e) => Some(e),
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Where a session keeps its layouts between runs.
pub trait LayoutStorage: Send {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<LayoutSetSnapshot>, StorageError>;

    fn save(&self, snapshot: &LayoutSetSnapshot) -> Result<(), StorageError>;

    /// Forget the saved snapshot. Clearing an empty backend is not an error.
    fn clear(&self) -> Result<(), StorageError>;
}

/// JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl LayoutStorage for FileStorage {
    fn load(&self) -> Result<Option<LayoutSetSnapshot>, StorageError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(StorageError::Corrupt)
    }

    fn save(&self, snapshot: &LayoutSetSnapshot) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(snapshot).map_err(StorageError::Corrupt)?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let temp = self.temp_path();
        std::fs::write(&temp, json)?;
        std::fs::rename(&temp, &self.path)?;
        tracing::trace!(target: "onyx.storage", path = %self.path.display(), "layout set saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-process storage; also counts saves for tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<LayoutSetSnapshot>>,
    saves: AtomicUsize,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_snapshot(snapshot: LayoutSetSnapshot) -> Self {
        Self {
            slot: Mutex::new(Some(snapshot)),
            saves: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn current(&self) -> Option<LayoutSetSnapshot> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl LayoutStorage for MemoryStorage {
    fn load(&self) -> Result<Option<LayoutSetSnapshot>, StorageError> {
        Ok(self.current())
    }

    fn save(&self, snapshot: &LayoutSetSnapshot) -> Result<(), StorageError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

impl<S: LayoutStorage + Sync + ?Sized> LayoutStorage for std::sync::Arc<S> {
    fn load(&self) -> Result<Option<LayoutSetSnapshot>, StorageError> {
        (**self).load()
    }

    fn save(&self, snapshot: &LayoutSetSnapshot) -> Result<(), StorageError> {
        (**self).save(snapshot)
    }

    fn clear(&self) -> Result<(), StorageError> {
        (**self).clear()
    }
}
