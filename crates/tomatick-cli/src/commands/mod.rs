pub mod config;
pub mod history;
pub mod modes;
pub mod run;
pub mod timer;

use tomatick_core::{
    Config, FocusSession, ManualScheduler, SavedSession, SqliteStore, StateStore,
};

/// Session for one-shot commands that change state. Nothing ticks; state is
/// read, changed and flushed before the process exits.
pub fn open_session() -> Result<FocusSession<SqliteStore, ManualScheduler>, Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let store = SqliteStore::open()?;
    Ok(FocusSession::open(
        store,
        ManualScheduler::new(),
        config.session_options(),
    ))
}

/// Decoded records for inspection commands. Neither the records nor the
/// config file are written.
pub fn inspect() -> Result<SavedSession, Box<dyn std::error::Error>> {
    let options = Config::peek().session_options();
    let store = StateStore::new(SqliteStore::open()?);
    Ok(SavedSession::load(&store, &options))
}
