//! Typed access to the three persisted records.
//!
//! Reads never fail: an absent record yields the default, and a malformed one
//! is logged and replaced by the default. Writes are best-effort through
//! [`StateStore::flush`]; in-memory state stays authoritative when they fail.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{KeyValueStore, HISTORY_KEY, MODES_KEY, TIMER_KEY};
use crate::error::{CoreError, Result};
use crate::history::HistoryLog;
use crate::modes::{ModeCatalog, ModeSettings};
use crate::timer::TimerState;

pub struct StateStore<K> {
    kv: K,
}

impl<K: KeyValueStore> StateStore<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    pub fn inner(&self) -> &K {
        &self.kv
    }

    pub fn into_inner(self) -> K {
        self.kv
    }

    /// Read and decode a record. `Ok(None)` when absent.
    ///
    /// # Errors
    /// `PersistenceRead` when the backend fails or the JSON does not decode.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let raw = self.kv.get(key).map_err(|e| CoreError::PersistenceRead {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| CoreError::PersistenceRead {
                key: key.to_string(),
                message: e.to_string(),
            })
    }

    /// Read a record, falling back to `default` when absent or unreadable.
    pub fn load_or<T: DeserializeOwned>(&self, key: &str, default: impl FnOnce() -> T) -> T {
        match self.read(key) {
            Ok(Some(value)) => value,
            Ok(None) => {
                tracing::debug!(key, "no persisted record, using default");
                default()
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding unreadable record");
                default()
            }
        }
    }

    /// Mode catalog from `modeSettings`, validated against the fixed ids.
    pub fn load_catalog(&self) -> ModeCatalog {
        match self.read::<ModeSettings>(MODES_KEY) {
            Ok(Some(settings)) => ModeCatalog::from_settings(settings).unwrap_or_else(|e| {
                tracing::warn!(key = MODES_KEY, error = %e, "invalid mode settings, using defaults");
                ModeCatalog::default()
            }),
            Ok(None) => ModeCatalog::default(),
            Err(e) => {
                tracing::warn!(key = MODES_KEY, error = %e, "discarding unreadable record");
                ModeCatalog::default()
            }
        }
    }

    pub fn load_timer(&self, catalog: &ModeCatalog) -> TimerState {
        self.load_or(TIMER_KEY, || TimerState::fresh(catalog))
    }

    pub fn load_history(&self) -> HistoryLog {
        self.load_or(HISTORY_KEY, HistoryLog::new)
    }

    /// Encode and store a record.
    ///
    /// # Errors
    /// Returns an error if encoding or the backend write fails.
    pub fn write<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.kv.set(key, &json)?;
        Ok(())
    }

    /// Best-effort write. Failures are logged, never returned.
    pub fn flush<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) {
        if let Err(e) = self.write(key, value) {
            tracing::warn!(key, error = %e, "failed to persist record");
        }
    }

    pub fn flush_timer(&mut self, state: &TimerState) {
        self.flush(TIMER_KEY, state);
    }

    pub fn flush_history(&mut self, history: &HistoryLog) {
        self.flush(HISTORY_KEY, history);
    }

    pub fn flush_catalog(&mut self, catalog: &ModeCatalog) {
        self.flush(MODES_KEY, &catalog.settings());
    }
}
