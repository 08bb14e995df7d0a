//! Outcome store - the single durable slot for the latest wizard run
//!
//! Besides the record itself a store keeps the highest submission
//! generation claimed so far. Claims and guarded saves are serialized, so a
//! slow submission can never overwrite the outcome of one started after it,
//! even when the two run in separate processes.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

use crate::core::outcome::OutcomeRecord;

/// Errors raised by an outcome store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access outcome store at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Stored outcome at {path} is not readable: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("Failed to encode outcome: {0}")]
    Encode(String),

    #[error("Outcome store lock was poisoned")]
    Poisoned,
}

/// Result of a generation-guarded save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardedSave {
    /// The record replaced the stored one
    Saved,
    /// A newer generation was claimed; nothing was written
    Superseded { latest: u64 },
}

/// Persistence contract for the latest outcome.
///
/// Every `save` replaces whatever was stored before; no history is kept.
pub trait OutcomeStore: Send + Sync {
    /// Read the stored record, if any
    fn load(&self) -> Result<Option<OutcomeRecord>, StoreError>;

    /// Replace the stored record
    fn save(&self, record: &OutcomeRecord) -> Result<(), StoreError>;

    /// Remove the stored record. Claimed generations are kept.
    fn clear(&self) -> Result<(), StoreError>;

    /// Claim the next submission generation, above every earlier claim and
    /// the stored record's generation
    fn claim_generation(&self) -> Result<u64, StoreError>;

    /// Save `record` unless a generation newer than its own has been claimed
    fn save_if_current(&self, record: &OutcomeRecord) -> Result<GuardedSave, StoreError>;
}

/// JSON file backed store
#[derive(Debug, Clone)]
pub struct FileOutcomeStore {
    path: PathBuf,
}

impl FileOutcomeStore {
    /// File name of the record inside the data directory
    pub const FILE_NAME: &'static str = "registration-data.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the platform data directory
    pub fn default_location() -> Option<Self> {
        directories::ProjectDirs::from("", "", "ipo-intake")
            .map(|dirs| Self::new(dirs.data_dir().join(Self::FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sidecar file holding the highest claimed generation; also the lock
    pub fn claim_path(&self) -> PathBuf {
        self.path.with_extension("json.lock")
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn ensure_parent_dir(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }
        Ok(())
    }

    /// Run `f` holding an exclusive lock on the claim file.
    /// The lock is released when the file handle drops.
    fn with_lock<R>(
        &self,
        f: impl FnOnce(&mut File) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        self.ensure_parent_dir()?;
        let claim_path = self.claim_path();
        let lock_error = |source| StoreError::Io {
            path: claim_path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&claim_path)
            .map_err(lock_error)?;
        file.lock_exclusive().map_err(lock_error)?;
        f(&mut file)
    }

    /// Highest generation known to the store; caller holds the lock
    fn latest_generation(&self, claim_file: &mut File) -> Result<u64, StoreError> {
        let mut text = String::new();
        claim_file
            .seek(SeekFrom::Start(0))
            .and_then(|_| claim_file.read_to_string(&mut text))
            .map_err(|e| self.io_error(e))?;
        let claimed: u64 = text.trim().parse().unwrap_or(0);
        let stored = match self.load() {
            Ok(record) => record.map_or(0, |r| r.generation),
            Err(StoreError::Corrupt { .. }) => 0,
            Err(e) => return Err(e),
        };
        Ok(claimed.max(stored))
    }

    fn write_record(&self, record: &OutcomeRecord) -> Result<(), StoreError> {
        let json =
            serde_json::to_string_pretty(record).map_err(|e| StoreError::Encode(e.to_string()))?;
        self.ensure_parent_dir()?;

        // Write beside the target and rename so readers never see a partial file
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), generation = record.generation, "outcome saved");
        Ok(())
    }
}

impl OutcomeStore for FileOutcomeStore {
    fn load(&self) -> Result<Option<OutcomeRecord>, StoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        if contents.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                path: self.path.clone(),
                message: e.to_string(),
            })
    }

    fn save(&self, record: &OutcomeRecord) -> Result<(), StoreError> {
        self.with_lock(|_| self.write_record(record))
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn claim_generation(&self) -> Result<u64, StoreError> {
        self.with_lock(|file| {
            let next = self.latest_generation(file)? + 1;
            file.set_len(0)
                .and_then(|()| file.seek(SeekFrom::Start(0)))
                .and_then(|_| write!(file, "{}", next))
                .and_then(|()| file.sync_all())
                .map_err(|e| self.io_error(e))?;
            debug!(generation = next, "generation claimed");
            Ok(next)
        })
    }

    fn save_if_current(&self, record: &OutcomeRecord) -> Result<GuardedSave, StoreError> {
        self.with_lock(|file| {
            let latest = self.latest_generation(file)?;
            if record.generation < latest {
                return Ok(GuardedSave::Superseded { latest });
            }
            self.write_record(record)?;
            Ok(GuardedSave::Saved)
        })
    }
}

#[derive(Debug, Default)]
struct Slot {
    record: Option<OutcomeRecord>,
    claimed: u64,
}

impl Slot {
    fn latest(&self) -> u64 {
        self.claimed
            .max(self.record.as_ref().map_or(0, |r| r.generation))
    }
}

/// In-memory store for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryOutcomeStore {
    slot: Mutex<Slot>,
}

impl MemoryOutcomeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutcomeStore for MemoryOutcomeStore {
    fn load(&self) -> Result<Option<OutcomeRecord>, StoreError> {
        let slot = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(slot.record.clone())
    }

    fn save(&self, record: &OutcomeRecord) -> Result<(), StoreError> {
        let mut slot = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        slot.record = Some(record.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut slot = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        slot.record = None;
        Ok(())
    }

    fn claim_generation(&self) -> Result<u64, StoreError> {
        let mut slot = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        slot.claimed = slot.latest() + 1;
        Ok(slot.claimed)
    }

    fn save_if_current(&self, record: &OutcomeRecord) -> Result<GuardedSave, StoreError> {
        let mut slot = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        let latest = slot.latest();
        if record.generation < latest {
            return Ok(GuardedSave::Superseded { latest });
        }
        slot.record = Some(record.clone());
        Ok(GuardedSave::Saved)
    }
}
