//! Authentication module for credential storage and the login lifecycle.
//!
//! This module provides:
//! - `SessionStore`: the injected key-value contract the API client uses
//! - `MemoryStore`, `FileStore`, `KeyringStore`: store backends
//! - `SessionManager`: login, logout, and session restore

pub mod credentials;
pub mod manager;
pub mod session;
pub mod store;

pub use credentials::KeyringStore;
pub use manager::SessionManager;
pub use session::{FileStore, SessionData};
pub use store::{MemoryStore, SessionStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
