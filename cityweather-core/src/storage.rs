//! Small key/value persistence used to remember the last searched city.

use async_trait::async_trait;
use std::{
    collections::{BTreeMap, HashMap},
    fmt::Debug,
    io::ErrorKind,
    path::PathBuf,
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

/// Key under which the last settled search term is stored.
pub const CITY_KEY: &str = "city";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storage file {path} is not a valid key/value table: {message}")]
    Format { path: PathBuf, message: String },
}

#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// String pairs kept in a TOML file, rewritten on every `set`.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store in the platform data directory.
    pub fn in_data_dir() -> anyhow::Result<Self> {
        let dirs = crate::Config::project_dirs()?;
        Ok(Self::new(dirs.data_dir().join("state.toml")))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }

    async fn read_table(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(self.io_err(e)),
        };

        toml::from_str(&contents).map_err(|e| StorageError::Format {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut table = self.read_table().await?;
        Ok(table.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut table = self.read_table().await?;
        table.insert(key.to_string(), value.to_string());

        let contents = toml::to_string(&table).map_err(|e| StorageError::Format {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_err(e))?;
        }

        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, contents)
            .await
            .map_err(|e| self.io_err(e))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| self.io_err(e))?;

        debug!(key, path = %self.path.display(), "stored value");
        Ok(())
    }
}

/// Process-local store; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.to_string(), value.to_string());
        Self {
            entries: Mutex::new(entries),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
