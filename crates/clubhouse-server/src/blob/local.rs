//! Filesystem-backed blob store.

use std::path::PathBuf;

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::{BlobError, BlobStore, validate_key};

/// Stores blobs as files under a root directory, one file per key.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, BlobError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[tonic::async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, content_type: &str, bytes: &[u8]) -> Result<String, BlobError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write to a sibling temp file and rename so readers never observe a
        // partially written proof.
        let tmp = path.with_extension("partial");
        let written = async {
            let mut file = fs::File::create(&tmp).await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
            fs::rename(&tmp, &path).await
        }
        .await;

        if let Err(e) = written {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!(key, content_type, size = bytes.len(), "Blob stored");
        Ok(key.to_string())
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_writes_file_and_returns_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());

        let reference = store
            .put("proofs/u1/r1.png", "image/png", b"\x89PNG")
            .await
            .unwrap();

        assert_eq!(reference, "proofs/u1/r1.png");
        let stored = std::fs::read(dir.path().join("proofs/u1/r1.png")).unwrap();
        assert_eq!(stored, b"\x89PNG");
        assert!(!dir.path().join("proofs/u1/r1.partial").exists());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());
        store.put("proofs/a.pdf", "application/pdf", b"%PDF").await.unwrap();

        store.delete("proofs/a.pdf").await.unwrap();
        store.delete("proofs/a.pdf").await.unwrap();
        assert!(!dir.path().join("proofs/a.pdf").exists());
    }

    #[tokio::test]
    async fn traversal_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path().join("root"));
        let err = store.put("../escape.png", "image/png", b"x").await.unwrap_err();
        assert!(matches!(err, BlobError::InvalidKey(_)));
    }
}
