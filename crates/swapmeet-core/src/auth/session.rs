use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::store::SessionStore;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub values: BTreeMap<String, String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Credentials persisted as JSON in the cache directory.
///
/// The whole map is rewritten on every mutation and the file is deleted
/// once the last key is removed, so a logged-out user leaves nothing behind.
pub struct FileStore {
    cache_dir: PathBuf,
    data: Mutex<SessionData>,
}

impl FileStore {
    /// Open the store, loading any session already on disk
    pub fn open(cache_dir: PathBuf) -> Result<Self> {
        let path = cache_dir.join(SESSION_FILE);
        let data = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .context("Failed to read session file")?;
            match serde_json::from_str(&contents) {
                Ok(data) => data,
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable session file");
                    SessionData::default()
                }
            }
        } else {
            SessionData::default()
        };

        Ok(Self {
            cache_dir,
            data: Mutex::new(data),
        })
    }

    /// When the stored credentials were last changed
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.data.lock().ok().and_then(|d| d.updated_at)
    }

    pub fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }

    fn save(&self, data: &SessionData) -> Result<()> {
        let path = self.session_path();
        if data.values.is_empty() {
            if path.exists() {
                std::fs::remove_file(&path).context("Failed to remove session file")?;
            }
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(data)?;
        write_private(&path, &contents)?;
        debug!(path = %path.display(), "Session saved");
        Ok(())
    }

    fn mutate(&self, f: impl FnOnce(&mut SessionData)) -> Result<()> {
        let mut data = self
            .data
            .lock()
            .map_err(|_| anyhow!("Session lock poisoned"))?;
        f(&mut *data);
        data.updated_at = Some(Utc::now());
        self.save(&data)
    }
}

/// Write a file readable only by the current user
#[cfg(unix)]
pub(crate) fn write_private(path: &Path, contents: &str) -> Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn write_private(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.data.lock().ok()?.values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.mutate(|data| {
            data.values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.mutate(|data| {
            data.values.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
    use std::sync::atomic::{AtomicUsize, Ordering};

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn scratch_dir() -> PathBuf {
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "swapmeet-session-test-{}-{}",
            std::process::id(),
            n
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_file_store_persists_across_open() {
        let dir = scratch_dir();
        {
            let store = FileStore::open(dir.clone()).unwrap();
            store.store_tokens("A1", "R1").unwrap();
            assert!(store.updated_at().is_some());
        }

        let reopened = FileStore::open(dir.clone()).unwrap();
        assert_eq!(reopened.get(ACCESS_TOKEN_KEY).as_deref(), Some("A1"));
        assert_eq!(reopened.get(REFRESH_TOKEN_KEY).as_deref(), Some("R1"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_file_removed_when_empty() {
        let dir = scratch_dir();
        let store = FileStore::open(dir.clone()).unwrap();
        store.store_tokens("A1", "R1").unwrap();
        assert!(store.session_path().exists());

        store.clear_tokens().unwrap();
        assert!(!store.session_path().exists());
        assert_eq!(store.get(ACCESS_TOKEN_KEY), None);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_corrupt_session_file_is_discarded() {
        let dir = scratch_dir();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(SESSION_FILE), "{not json").unwrap();

        let store = FileStore::open(dir.clone()).unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY), None);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
