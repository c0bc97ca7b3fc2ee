//! The credential store contract the API client depends on.
//!
//! The client never owns credentials directly. It reads and writes them
//! through a `SessionStore` handed to it at construction, so hosts can pick
//! persistence (keychain, file, memory) and tests can inspect every mutation.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};

/// Store key holding the short-lived bearer credential
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Store key holding the credential used to mint new access tokens
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Key-value credential storage injected into the API client.
///
/// `get` reports absence as `None`; backends that can fail on read should
/// log and return `None` rather than surface the error, since a missing
/// credential and an unreadable one lead to the same behavior.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a key that is not present succeeds.
    fn remove(&self, key: &str) -> Result<()>;

    /// Store both halves of a freshly issued token pair
    fn store_tokens(&self, access: &str, refresh: &str) -> Result<()> {
        self.set(ACCESS_TOKEN_KEY, access)?;
        self.set(REFRESH_TOKEN_KEY, refresh)
    }

    /// Drop both credentials, attempting each even if the first fails
    fn clear_tokens(&self) -> Result<()> {
        let access = self.remove(ACCESS_TOKEN_KEY);
        let refresh = self.remove(REFRESH_TOKEN_KEY);
        access.and(refresh)
    }
}

/// In-process store. Credentials vanish when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with a token pair
    pub fn with_tokens(access: &str, refresh: &str) -> Self {
        let store = Self::new();
        if let Ok(mut values) = store.values.write() {
            values.insert(ACCESS_TOKEN_KEY.to_string(), access.to_string());
            values.insert(REFRESH_TOKEN_KEY.to_string(), refresh.to_string());
        }
        store
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().map(|v| v.is_empty()).unwrap_or(true)
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| anyhow!("Memory store lock poisoned"))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| anyhow!("Memory store lock poisoned"))?;
        values.remove(key);
        Ok(())
    }
}
