mod config;
pub mod database;

pub use config::{AudioConfig, Config, EngineConfig};
pub use database::Database;

use std::path::PathBuf;

use crate::error::{ConfigError, Result};
use crate::state::AppState;

/// Namespaced key the whole [`AppState`] is stored under.
pub const STATE_KEY: &str = "fart-app-storage";

/// Returns `~/.config/fartalarm[-dev]/` based on FARTALARM_ENV.
///
/// Set FARTALARM_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FARTALARM_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("fartalarm-dev")
    } else {
        base_dir.join("fartalarm")
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Whole-structure persistence. No partial writes: every save replaces
/// what was there.
pub trait StateStore {
    /// `None` on first run.
    fn load(&self) -> Result<Option<AppState>>;
    fn save(&mut self, state: &AppState) -> Result<()>;
}

/// Keeps the last saved state in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    pub state: Option<AppState>,
    pub saves: usize,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: AppState) -> Self {
        Self {
            state: Some(state),
            saves: 0,
        }
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> Result<Option<AppState>> {
        Ok(self.state.clone())
    }

    fn save(&mut self, state: &AppState) -> Result<()> {
        self.state = Some(state.clone());
        self.saves += 1;
        Ok(())
    }
}

impl<S: StateStore> StateStore for std::rc::Rc<std::cell::RefCell<S>> {
    fn load(&self) -> Result<Option<AppState>> {
        self.borrow().load()
    }

    fn save(&mut self, state: &AppState) -> Result<()> {
        self.borrow_mut().save(state)
    }
}
