//! Key/value persistence port
//!
//! Every piece of local state (high score, achievement flags, extra lives,
//! preferences) is stored as a string under a well-known key. The engine only
//! talks to [`KeyValueStore`], so it runs against browser LocalStorage on the
//! web and an in-memory map everywhere else.
//!
//! Readers never propagate failures: a missing, unreadable or malformed value
//! degrades to the default so the game stays playable without storage.

#[cfg(target_arch = "wasm32")]
mod local;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::str::FromStr;

use thiserror::Error;

#[cfg(target_arch = "wasm32")]
pub use local::LocalStore;

/// Storage keys
pub mod keys {
    pub const HIGH_SCORE: &str = "snakeHighScore";
    pub const GAMES_PLAYED: &str = "snakeGamesPlayed";
    pub const THEME: &str = "snakeGameTheme";
    pub const PURCHASED_THEMES: &str = "snakePurchasedThemes";
    pub const EXTRA_LIVES: &str = "snakeExtraLives";
    pub const TRACKING_PERMISSION: &str = "snakeTrackingPermission";

    /// Unlock flag for an achievement
    pub fn achievement(id: &str) -> String {
        format!("achievement_{id}")
    }

    /// Unlock timestamp (ms since epoch) for an achievement
    pub fn achievement_date(id: &str) -> String {
        format!("achievement_{id}_date")
    }
}

/// Errors raised by a storage backend
#[derive(Debug, Error, PartialEq)]
pub enum StorageError {
    #[error("storage backend is unavailable")]
    Unavailable,
    #[error("failed to read key {key}: {reason}")]
    Read { key: String, reason: String },
    #[error("failed to write key {key}: {reason}")]
    Write { key: String, reason: String },
}

/// String key/value storage
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory store. Clones share the same map, like two tabs on one origin.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Read and parse a value, falling back to `default` on any failure
pub fn load_or<T: FromStr>(store: &dyn KeyValueStore, key: &str, default: T) -> T {
    match store.get(key) {
        Ok(Some(raw)) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                log::warn!("Ignoring malformed value for {key}: {raw:?}");
                default
            }
        },
        Ok(None) => default,
        Err(e) => {
            log::warn!("Storage read failed, using default: {e}");
            default
        }
    }
}

/// Write a value, logging instead of propagating failures.
/// Returns whether the write landed.
pub fn save<T: ToString>(store: &dyn KeyValueStore, key: &str, value: T) -> bool {
    match store.set(key, &value.to_string()) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Storage write failed: {e}");
            false
        }
    }
}

/// Store that fails every operation, for exercising degraded paths
#[cfg(test)]
pub(crate) struct BrokenStore;

#[cfg(test)]
impl KeyValueStore for BrokenStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable)
    }

    fn set(&self, key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Write {
            key: key.to_string(),
            reason: "quota exceeded".to_string(),
        })
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }
}
