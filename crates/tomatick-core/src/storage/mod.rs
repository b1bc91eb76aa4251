mod config;
pub mod memory;
pub mod sqlite;
pub mod state;

pub use config::{Config, SoundConfig, TimerConfig};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use state::StateStore;

use std::path::PathBuf;

use crate::error::StorageError;

/// Key holding the serialized `TimerState`.
pub const TIMER_KEY: &str = "timerData";
/// Key holding the newest-first history entries.
pub const HISTORY_KEY: &str = "history";
/// Key holding the mode id -> definition map.
pub const MODES_KEY: &str = "modeSettings";

/// Opaque string store addressed by key.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Returns the data directory, creating it if needed.
///
/// `TOMATICK_DATA_DIR` overrides the location. Otherwise this is
/// `~/.config/tomatick[-dev]/`, with `TOMATICK_ENV=dev` selecting the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("TOMATICK_DATA_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("TOMATICK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("tomatick-dev")
            } else {
                base_dir.join("tomatick")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
