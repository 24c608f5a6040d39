use std::fmt::Display;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{AppError, AppResult};

pub mod file;
pub mod memory;
pub mod redis;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use self::redis::{RedisStore, RedisWriterHandle};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Watched,
}

impl Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKey::Watched => write!(f, "watched"),
        }
    }
}

/// Durable text-keyed storage of serialized values
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored text, or `None` if the key was never written
    async fn get_raw(&self, key: &str) -> AppResult<Option<String>>;

    /// Overwrites the value at `key`. Backends may complete the write later.
    async fn set_raw(&self, key: &str, value: String) -> AppResult<()>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Typed JSON round-tripping on top of a [`KeyValueStore`]
#[derive(Clone)]
pub struct PersistedStore {
    backend: Arc<dyn KeyValueStore>,
}

impl PersistedStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Loads and deserializes the value at `key`.
    ///
    /// A missing key and a stored JSON `null` both yield `None`.
    pub async fn load<T: DeserializeOwned>(&self, key: &StoreKey) -> AppResult<Option<T>> {
        let key = key.to_string();
        match self.backend.get_raw(&key).await? {
            Some(json) => {
                let value: Option<T> = serde_json::from_str(&json).map_err(|e| {
                    tracing::error!(
                        key = %key,
                        backend = self.backend.name(),
                        error = %e,
                        "Stored value does not match the expected shape"
                    );
                    AppError::Serialization(e)
                })?;
                Ok(value)
            }
            None => Ok(None),
        }
    }

    /// Like [`PersistedStore::load`], falling back to `T::default()` when absent
    pub async fn load_or_default<T: DeserializeOwned + Default>(&self, key: &StoreKey) -> AppResult<T> {
        Ok(self.load(key).await?.unwrap_or_default())
    }

    pub async fn save<T: Serialize>(&self, key: &StoreKey, value: &T) -> AppResult<()> {
        let json = serde_json::to_string(value)?;
        self.backend.set_raw(&key.to_string(), json).await
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}
