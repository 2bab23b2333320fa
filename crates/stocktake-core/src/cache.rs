use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::model::{Item, ItemsSnapshot, List};

const CACHE_VERSION: i64 = 1;

/// Whole-value mirror of one store's counting state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheState {
    pub version: i64,
    pub store_id: u64,
    pub fetched_at: String,
    pub current_list_index: usize,
    pub current_item_index: usize,
    #[serde(default)]
    pub lists: Vec<List>,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl CacheState {
    pub fn new(
        store_id: u64,
        snapshot: &ItemsSnapshot,
        current_list_index: usize,
        current_item_index: usize,
    ) -> Self {
        let fetched_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        Self {
            version: CACHE_VERSION,
            store_id,
            fetched_at,
            current_list_index,
            current_item_index,
            lists: snapshot.lists.clone(),
            items: snapshot.items.clone(),
        }
    }

    pub fn snapshot(&self) -> ItemsSnapshot {
        ItemsSnapshot {
            items: self.items.clone(),
            lists: self.lists.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to read cache at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse cache at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to write cache at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize cache: {0}")]
    Serialize(toml::ser::Error),
    #[error("invalid cache at {path}: {message}")]
    InvalidSchema { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalCache {
    path: PathBuf,
}

pub fn cache_path(config_dir: &Path, store_id: u64) -> PathBuf {
    config_dir
        .join("cache")
        .join(format!("store-{store_id}.toml"))
}

impl LocalCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn for_store(config_dir: &Path, store_id: u64) -> Self {
        Self::new(cache_path(config_dir, store_id))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<CacheState>, CacheError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&self.path).map_err(|source| CacheError::Read {
            path: self.path.clone(),
            source,
        })?;
        let state: CacheState = toml::from_str(&raw).map_err(|source| CacheError::Parse {
            path: self.path.clone(),
            source,
        })?;

        self.validate(&state)?;
        Ok(Some(state))
    }

    /// Replaces the cached state. Readers never observe a partial write.
    pub fn store(&self, state: &CacheState) -> Result<(), CacheError> {
        self.validate(state)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| CacheError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let serialized = toml::to_string(state).map_err(CacheError::Serialize)?;
        let temp_path = self.path.with_extension("toml.tmp");
        fs::write(&temp_path, serialized).map_err(|source| CacheError::Write {
            path: temp_path.clone(),
            source,
        })?;
        fs::rename(&temp_path, &self.path).map_err(|source| CacheError::Write {
            path: self.path.clone(),
            source,
        })?;

        tracing::debug!(
            path = %self.path.display(),
            items = state.items.len(),
            lists = state.lists.len(),
            "stored local cache"
        );
        Ok(())
    }

    pub fn clear(&self) -> Result<(), CacheError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CacheError::Write {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn validate(&self, state: &CacheState) -> Result<(), CacheError> {
        if state.version != CACHE_VERSION {
            return Err(self.schema_error(format!(
                "unsupported version (expected {CACHE_VERSION}, found {})",
                state.version
            )));
        }

        if !state.lists.is_empty() && state.current_list_index >= state.lists.len() {
            return Err(self.schema_error(format!(
                "current_list_index {} is outside {} lists",
                state.current_list_index,
                state.lists.len()
            )));
        }

        if !state.items.is_empty() && state.current_item_index >= state.items.len() {
            return Err(self.schema_error(format!(
                "current_item_index {} is outside {} items",
                state.current_item_index,
                state.items.len()
            )));
        }

        Ok(())
    }

    fn schema_error(&self, message: String) -> CacheError {
        CacheError::InvalidSchema {
            path: self.path.clone(),
            message,
        }
    }
}
