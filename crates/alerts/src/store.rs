//! JSON file store for the bot configuration.
//!
//! The whole config is read once at startup and rewritten on every mutation.
//! Persistence failures are logged and never reach the caller; the in-memory
//! copy stays authoritative.

use buybot_core::{BotConfig, DailyTime};
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Shared handle to the persisted configuration.
///
/// Mutations hold the lock until the file write finishes, so concurrent
/// writers are serialized.
#[derive(Clone)]
pub struct ConfigStore {
    path: Arc<PathBuf>,
    config: Arc<Mutex<BotConfig>>,
}

impl ConfigStore {
    /// Load the config from `path`.
    ///
    /// A missing file is a first run: defaults are written immediately. Any
    /// other failure is logged and the store continues with defaults.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let config = match read_config(&path).await {
            Ok(config) => {
                info!(path = %path.display(), "Loaded bot config");
                config
            }
            Err(StoreError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "No config found, creating defaults");
                let config = BotConfig::default();
                if let Err(e) = write_config(&path, &config).await {
                    error!(path = %path.display(), error = %e, "Failed to write default config");
                }
                config
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to read config, using defaults");
                BotConfig::default()
            }
        };

        Self {
            path: Arc::new(path),
            config: Arc::new(Mutex::new(config)),
        }
    }

    /// Copy of the current config.
    pub async fn snapshot(&self) -> BotConfig {
        self.config.lock().await.clone()
    }

    /// Write the current config to disk.
    pub async fn save(&self) {
        let config = self.config.lock().await;
        self.persist(&*config).await;
    }

    /// Apply a mutation and persist the result.
    pub async fn update<R>(&self, f: impl FnOnce(&mut BotConfig) -> R) -> R {
        let mut config = self.config.lock().await;
        let result = f(&mut *config);
        self.persist(&*config).await;
        result
    }

    /// Add a watch address. Returns false if it was already listed.
    pub async fn add_watch(&self, address: &str) -> bool {
        self.update(|c| c.add_watch(address)).await
    }

    /// Remove a watch address. Returns false if it was not listed.
    pub async fn remove_watch(&self, address: &str) -> bool {
        self.update(|c| c.remove_watch(address)).await
    }

    /// Commit a verified contract and the chat it was configured from.
    pub async fn set_contract(&self, address: &str, chat_id: i64) {
        self.update(|c| {
            c.contract_address = address.trim().to_string();
            c.chat_id = Some(chat_id);
        })
        .await
    }

    pub async fn set_chat_id(&self, chat_id: i64) {
        self.update(|c| c.chat_id = Some(chat_id)).await
    }

    /// Set the alert animation; an empty value clears it.
    pub async fn set_alert_gif(&self, gif: &str) {
        self.update(|c| c.alert_gif = gif.trim().to_string()).await
    }

    pub async fn add_schedule(&self, time: DailyTime) -> bool {
        self.update(|c| c.add_schedule(time)).await
    }

    pub async fn remove_schedule(&self, time: DailyTime) -> bool {
        self.update(|c| c.remove_schedule(time)).await
    }

    /// Record a completed update cycle.
    pub async fn mark_updated(&self, at: DateTime<Utc>) {
        self.update(|c| c.last_update = Some(at)).await
    }

    async fn persist(&self, config: &BotConfig) {
        match write_config(&self.path, config).await {
            Ok(()) => debug!(path = %self.path.display(), "Saved bot config"),
            Err(e) => error!(path = %self.path.display(), error = %e, "Failed to save config"),
        }
    }
}

async fn read_config(path: &Path) -> Result<BotConfig, StoreError> {
    let raw = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&raw)?)
}

/// Overwrite the file via a sibling temp file and rename.
async fn write_config(path: &Path, config: &BotConfig) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_string_pretty(config)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
