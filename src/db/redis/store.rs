use redis::{Client, Commands};
use std::fmt::Display;

use crate::db::KeyValueStore;
use crate::error::AppResult;

/// Prefix applied to every key so the lists can share a Redis instance
pub const KEY_NAMESPACE: &str = "moviematch";

/// A namespaced Redis key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey<'a>(pub &'a str);

impl Display for StoreKey<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", KEY_NAMESPACE, self.0)
    }
}

/// Creates a Redis client for list storage
///
/// Opening the client does not connect; the first command does.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Redis-backed key-value store
///
/// Values are stored without expiry. Each call takes its own blocking
/// connection, which keeps the store `Sync` without a lock.
#[derive(Clone)]
pub struct RedisStore {
    redis_client: Client,
}

impl RedisStore {
    pub fn new(redis_client: Client) -> Self {
        Self { redis_client }
    }
}

impl KeyValueStore for RedisStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.redis_client.get_connection()?;
        let value: Option<String> = conn.get(StoreKey(key).to_string())?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut conn = self.redis_client.get_connection()?;
        let _: () = conn.set(StoreKey(key).to_string(), value)?;
        tracing::debug!(key = %StoreKey(key), bytes = value.len(), "Stored value in Redis");
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let mut conn = self.redis_client.get_connection()?;
        let _: () = conn.del(StoreKey(key).to_string())?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
