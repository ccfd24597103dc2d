//! Best-score persistence
//!
//! The simulation only ever needs one integer: the best score. Hosts plug in
//! a [`ScoreStore`]:
//! - [`MemoryStore`] for tests and throwaway sessions
//! - [`JsonFileStore`] for the native binary
//! - [`LocalStorageStore`] in the browser

use std::fmt;

use serde::{Deserialize, Serialize};

/// Storage failures. None of these end the game.
#[derive(Debug)]
pub enum StoreError {
    /// Backing storage isn't reachable (no window, private mode, ...)
    Unavailable,
    Io(std::io::Error),
    /// Stored value couldn't be decoded
    Corrupt(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "score storage unavailable"),
            Self::Io(e) => write!(f, "score storage i/o error: {e}"),
            Self::Corrupt(msg) => write!(f, "stored best score is corrupt: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Key/value home of the persisted best score
pub trait ScoreStore {
    /// `Ok(None)` when nothing has been stored yet
    fn load_best(&self) -> Result<Option<u64>, StoreError>;
    fn save_best(&mut self, score: u64) -> Result<(), StoreError>;
}

/// Read the best score, treating any failure as "no score yet"
pub fn load_best_or_zero(store: &dyn ScoreStore) -> u64 {
    match store.load_best() {
        Ok(best) => best.unwrap_or(0),
        Err(e) => {
            log::warn!("Could not load best score: {e}");
            0
        }
    }
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    value: Option<u64>,
    /// Number of successful saves
    pub writes: u32,
}

impl MemoryStore {
    pub fn with_best(best: u64) -> Self {
        Self {
            value: Some(best),
            writes: 0,
        }
    }
}

impl ScoreStore for MemoryStore {
    fn load_best(&self) -> Result<Option<u64>, StoreError> {
        Ok(self.value)
    }

    fn save_best(&mut self, score: u64) -> Result<(), StoreError> {
        self.value = Some(score);
        self.writes += 1;
        Ok(())
    }
}

/// On-disk record
#[derive(Debug, Serialize, Deserialize)]
struct BestRecord {
    best_score: u64,
}

/// JSON file store (native)
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: std::path::PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ScoreStore for JsonFileStore {
    fn load_best(&self) -> Result<Option<u64>, StoreError> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record: BestRecord =
            serde_json::from_str(&json).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok(Some(record.best_score))
    }

    fn save_best(&mut self, score: u64) -> Result<(), StoreError> {
        let json = serde_json::to_string(&BestRecord { best_score: score })
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        // Write-then-rename (backup rotation: tmp → save)
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        log::info!("Best score {} saved to {}", score, self.path.display());
        Ok(())
    }
}

/// Browser LocalStorage store (WASM only)
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Default)]
pub struct LocalStorageStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    const STORAGE_KEY: &'static str = "bestScore";

    fn storage() -> Result<web_sys::Storage, StoreError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(StoreError::Unavailable)
    }
}

#[cfg(target_arch = "wasm32")]
impl ScoreStore for LocalStorageStore {
    fn load_best(&self) -> Result<Option<u64>, StoreError> {
        let storage = Self::storage()?;
        match storage.get_item(Self::STORAGE_KEY) {
            Ok(Some(raw)) => raw
                .trim()
                .parse::<u64>()
                .map(Some)
                .map_err(|e| StoreError::Corrupt(e.to_string())),
            Ok(None) => Ok(None),
            Err(_) => Err(StoreError::Unavailable),
        }
    }

    fn save_best(&mut self, score: u64) -> Result<(), StoreError> {
        let storage = Self::storage()?;
        storage
            .set_item(Self::STORAGE_KEY, &score.to_string())
            .map_err(|_| StoreError::Unavailable)?;
        log::info!("Best score {} saved", score);
        Ok(())
    }
}
