//! File-backed key-value store: one `<key>.json` file per key.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use sphere_core::error::{AppError, ErrorKind};
use sphere_core::result::AppResult;
use sphere_core::traits::store::KeyValueStore;

/// Persists each key as a file under a root directory.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash mid-write leaves the previous value intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `root_path`, creating the directory if needed.
    pub async fn new(root_path: impl AsRef<Path>) -> AppResult<Self> {
        let root = root_path.as_ref().to_path_buf();
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create store directory: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> AppResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(AppError::validation(format!("Invalid store key: {key:?}")));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    fn store_type(&self) -> &str {
        "file"
    }

    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let path = self.resolve(key)?;
        match fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to read {}", path.display()),
                e,
            )),
        }
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let path = self.resolve(key)?;
        let tmp = path.with_extension("json.tmp");

        fs::write(&tmp, value).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write {}", tmp.display()),
                e,
            )
        })?;
        fs::rename(&tmp, &path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to replace {}", path.display()),
                e,
            )
        })?;

        debug!(key, bytes = value.len(), "Wrote store key");
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.resolve(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to delete {}", path.display()),
                e,
            )),
        }
    }
}
