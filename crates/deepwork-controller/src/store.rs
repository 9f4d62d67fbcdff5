//! Persisted focus state.

use async_trait::async_trait;
use deepwork_core::{DeepWorkError, DeepWorkResult, Timestamp};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Process-wide focus state, persisted across restarts
///
/// `session_start` is set exactly when `enabled` is, apart from the window
/// between startup and the end of `restore_on_startup`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusState {
    #[serde(rename = "deepworkEnabled", default)]
    pub enabled: bool,

    /// Milliseconds since the Unix epoch
    #[serde(rename = "deepworkStartTime", default)]
    pub session_start: Option<Timestamp>,
}

impl FocusState {
    pub fn enabled_since(start: Timestamp) -> Self {
        Self {
            enabled: true,
            session_start: Some(start),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }
}

/// Key-value persistence that survives process restarts
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self) -> DeepWorkResult<FocusState>;

    async fn save(&self, state: FocusState) -> DeepWorkResult<()>;

    async fn session_start(&self) -> DeepWorkResult<Option<Timestamp>> {
        Ok(self.load().await?.session_start)
    }
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<FocusState>,
}

impl MemoryStore {
    pub fn new(state: FocusState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FocusState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load(&self) -> DeepWorkResult<FocusState> {
        Ok(*self.lock())
    }

    async fn save(&self, state: FocusState) -> DeepWorkResult<()> {
        *self.lock() = state;
        Ok(())
    }
}

/// JSON file store
///
/// A missing file reads as the disabled state. A corrupt file is logged and
/// also reads as disabled, so a damaged profile cannot wedge the controller.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn load(&self) -> DeepWorkResult<FocusState> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(FocusState::default()),
            Err(e) => {
                return Err(DeepWorkError::storage(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        match serde_json::from_str(&json) {
            Ok(state) => Ok(state),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Corrupt focus state, resetting");
                Ok(FocusState::default())
            }
        }
    }

    async fn save(&self, state: FocusState) -> DeepWorkResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&state)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
