//! Key-value persistence for the movie lists
//!
//! Every backend stores opaque JSON strings under plain string keys. Callers
//! own the encoding; backends never inspect values.

use std::path::Path;

use crate::config::{Config, StorageBackend};
use crate::error::AppResult;

pub mod file;
pub mod memory;
pub mod redis;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use self::redis::{create_redis_client, RedisStore, StoreKey};

/// A synchronous string key-value store
///
/// Writes are durable by the time `set` returns. There is no transaction
/// spanning several keys.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value under `key`, or `None` if nothing was ever written
    fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Replaces the value under `key`
    fn set(&self, key: &str, value: &str) -> AppResult<()>;

    /// Deletes `key`; deleting a missing key is not an error
    fn remove(&self, key: &str) -> AppResult<()>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Opens the persistent store selected by the configuration
pub fn open_store(config: &Config) -> anyhow::Result<Box<dyn KeyValueStore>> {
    let store: Box<dyn KeyValueStore> = match config.storage_backend {
        StorageBackend::File => Box::new(FileStore::open(&config.data_dir)?),
        StorageBackend::Redis => {
            let client = create_redis_client(&config.redis_url)?;
            Box::new(RedisStore::new(client))
        }
        StorageBackend::Memory => Box::new(MemoryStore::new()),
    };

    tracing::info!(backend = store.name(), "Opened list storage");
    Ok(store)
}

/// Opens the session store that carries the selection between commands
///
/// The session always lives on disk next to the data directory so that a
/// `select` followed by `analyze` works even with the memory backend.
pub fn open_session_store(session_dir: &Path) -> anyhow::Result<FileStore> {
    Ok(FileStore::open(session_dir)?)
}
