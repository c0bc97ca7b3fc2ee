//! # swapmeet-core
//!
//! Core library for the swapmeet barter marketplace client.
//!
//! ## Modules
//!
//! - [`api`] - Session-aware REST client and resource wrappers
//! - [`auth`] - Credential stores and the login lifecycle
//! - [`config`] - Configuration and base URL resolution
//! - [`models`] - Wire models for listings, offers, and messages

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, RefreshMode};
pub use auth::{FileStore, KeyringStore, MemoryStore, SessionManager, SessionStore};
pub use config::Config;
