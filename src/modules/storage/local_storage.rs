//! Local disk storage for uploaded files
//!
//! Files are written flat into a single upload directory under the name the
//! caller chooses. Names are validated by the caller before reaching here.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};

use crate::core::error::{AppError, Result};

/// Disk-backed file store rooted at the upload directory
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Create the storage, making sure the upload directory exists
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::Internal(format!(
                "Failed to create upload directory '{}': {}",
                root.display(),
                e
            ))
        })?;

        info!("Local storage ready at {}", root.display());
        Ok(Self { root })
    }

    /// Absolute location for a stored name
    pub fn path_for(&self, stored_name: &str) -> PathBuf {
        self.root.join(stored_name)
    }

    /// Write bytes under `stored_name` and return the full path
    pub async fn write(&self, stored_name: &str, data: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(stored_name);
        fs::write(&path, data).await?;

        debug!("Wrote {} bytes to {}", data.len(), path.display());
        Ok(path)
    }

    /// Read the bytes stored under `stored_name`
    pub async fn read(&self, stored_name: &str) -> Result<Vec<u8>> {
        let path = self.path_for(stored_name);
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("File record exists but {} is missing on disk", path.display());
                Err(AppError::NotFound("File not found".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a file. Returns `false` when it was already gone.
    pub async fn remove(&self, path: &Path) -> Result<bool> {
        match fs::remove_file(path).await {
            Ok(()) => {
                debug!("Removed {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_read_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("nested/uploads"))
            .await
            .unwrap();

        let path = storage.write("doc.pdf", b"%PDF-1.4").await.unwrap();
        assert!(path.starts_with(dir.path().join("nested/uploads")));
        assert_eq!(storage.read("doc.pdf").await.unwrap(), b"%PDF-1.4".to_vec());

        assert!(storage.remove(&path).await.unwrap());
        assert!(!storage.remove(&path).await.unwrap());
    }

    #[tokio::test]
    async fn test_read_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let err = storage.read("nope.bin").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
