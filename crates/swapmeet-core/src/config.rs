//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the API URL override, the credential backend, and the
//! last used login email.
//!
//! Configuration is stored at `~/.config/swapmeet/config.json`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::auth::session::write_private;
use crate::auth::{FileStore, KeyringStore, SessionStore};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "swapmeet";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "SWAPMEET_API_URL";

/// Environment variable naming the host the default API path is served from
pub const HOST_ENV: &str = "SWAPMEET_HOST";

/// API path used when no base URL is configured
pub const DEFAULT_API_PATH: &str = "/api";

/// Local development server
pub const DEFAULT_HOST: &str = "http://localhost:8000";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    #[default]
    Keyring,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_url: Option<String>,
    #[serde(default)]
    pub credential_backend: CredentialBackend,
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Persist the config. It holds the last login email, so it is kept private.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        write_private(path, &contents)
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Base URL from the environment, then this config, then the default
    pub fn resolve_base_url(&self) -> String {
        resolve_base_url(
            std::env::var(API_URL_ENV).ok().as_deref(),
            self.api_url.as_deref(),
            std::env::var(HOST_ENV).ok().as_deref(),
        )
    }

    /// Open the credential store selected by `credential_backend`
    pub fn session_store(&self) -> Result<Arc<dyn SessionStore>> {
        Ok(match self.credential_backend {
            CredentialBackend::Keyring => Arc::new(KeyringStore::new()),
            CredentialBackend::File => Arc::new(FileStore::open(self.cache_dir()?)?),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Pick the API base URL. Blank values count as unset.
pub fn resolve_base_url(env_url: Option<&str>, configured: Option<&str>, host: Option<&str>) -> String {
    if let Some(url) = non_empty(env_url).or(non_empty(configured)) {
        return url.trim_end_matches('/').to_string();
    }
    let host = non_empty(host).unwrap_or(DEFAULT_HOST);
    format!("{}{}", host.trim_end_matches('/'), DEFAULT_API_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_base_url_prefers_env() {
        assert_eq!(
            resolve_base_url(Some("https://swap.example/api/"), Some("http://other/api"), None),
            "https://swap.example/api"
        );
    }

    #[test]
    fn test_resolve_base_url_falls_back_to_config() {
        assert_eq!(
            resolve_base_url(Some("  "), Some("http://other/api"), None),
            "http://other/api"
        );
    }

    #[test]
    fn test_resolve_base_url_default_path() {
        assert_eq!(resolve_base_url(None, None, None), "http://localhost:8000/api");
        assert_eq!(
            resolve_base_url(None, None, Some("https://swap.example/")),
            "https://swap.example/api"
        );
    }

    #[test]
    fn test_config_defaults_to_keyring() {
        let config: Config = serde_json::from_str(r#"{"api_url": null, "last_email": null}"#).unwrap();
        assert_eq!(config.credential_backend, CredentialBackend::Keyring);

        let file: Config = serde_json::from_str(r#"{"credential_backend": "file"}"#).unwrap();
        assert_eq!(file.credential_backend, CredentialBackend::File);
    }

    #[test]
    fn test_save_round_trips_and_is_private() {
        let dir = std::env::temp_dir().join(format!("swapmeet-config-test-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join(CONFIG_FILE);

        assert!(Config::load_from(&path).unwrap().last_email.is_none());

        let config = Config {
            last_email: Some("ana@example.com".to_string()),
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.last_email.as_deref(), Some("ana@example.com"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        let _ = std::fs::remove_dir_all(&dir);
    }
}
