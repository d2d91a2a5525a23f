//! # Document Store
//!
//! Opaque blob storage keyed by path string: contract PDFs, logos, robot
//! images.
//!
//! ```text
//! contracts/{contract_id}/v{version}.pdf
//! logos/{name}
//! robots/{robot_model}/{name}
//! ```
//!
//! [`LocalDirStore`] keeps blobs under a root directory on disk. Every call
//! is a single awaited operation with no retry.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// Document store failures.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Storage I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Bucket-style blob storage.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Writes `bytes` at `path`, replacing any existing blob.
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> StorageResult<()>;

    async fn download(&self, path: &str) -> StorageResult<Vec<u8>>;

    async fn remove(&self, path: &str) -> StorageResult<()>;

    /// Address a client can fetch the blob from.
    fn public_url(&self, path: &str) -> String;
}

/// Path of one contract PDF version.
pub fn contract_version_path(contract_id: &str, version: i64) -> String {
    format!("contracts/{}/v{}.pdf", contract_id, version)
}

/// Stores blobs as files below a root directory.
#[derive(Debug, Clone)]
pub struct LocalDirStore {
    root: PathBuf,
}

impl LocalDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalDirStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Joins `path` under the root; rejects absolute paths and `..`.
    fn resolve(&self, path: &str) -> StorageResult<PathBuf> {
        let relative = Path::new(path);
        let clean = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !clean {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn io_error(path: &str, source: std::io::Error) -> StorageError {
        if source.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound(path.to_string())
        } else {
            StorageError::Io {
                path: path.to_string(),
                source,
            }
        }
    }
}

#[async_trait]
impl DocumentStore for LocalDirStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> StorageResult<()> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Self::io_error(path, e))?;
        }

        debug!(path = %path, bytes = bytes.len(), "Uploading document");
        tokio::fs::write(&target, bytes)
            .await
            .map_err(|e| Self::io_error(path, e))
    }

    async fn download(&self, path: &str) -> StorageResult<Vec<u8>> {
        let target = self.resolve(path)?;
        tokio::fs::read(&target)
            .await
            .map_err(|e| Self::io_error(path, e))
    }

    async fn remove(&self, path: &str) -> StorageResult<()> {
        let target = self.resolve(path)?;
        debug!(path = %path, "Removing document");
        tokio::fs::remove_file(&target)
            .await
            .map_err(|e| Self::io_error(path, e))
    }

    fn public_url(&self, path: &str) -> String {
        format!("file://{}", self.root.join(path).display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_download_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDirStore::new(dir.path());
        let path = contract_version_path("c-1", 1);

        store.upload(&path, b"%PDF-1.7".to_vec()).await.unwrap();
        assert_eq!(store.download(&path).await.unwrap(), b"%PDF-1.7");
        assert!(dir.path().join("contracts/c-1/v1.pdf").exists());

        store.remove(&path).await.unwrap();
        assert!(matches!(
            store.download(&path).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDirStore::new(dir.path());

        for bad in ["../secret.pdf", "/etc/passwd", ""] {
            assert!(matches!(
                store.upload(bad, Vec::new()).await,
                Err(StorageError::InvalidPath(_))
            ));
        }
    }
}
