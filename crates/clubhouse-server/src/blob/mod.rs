//! Object storage for uploaded payment proofs.

mod local;

pub use local::LocalBlobStore;

/// Blob storage errors.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("Invalid blob key: {0}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Blob backend unavailable: {0}")]
    Unavailable(String),
}

/// Durable storage for uploaded files.
///
/// `put` returns the reference persisted on the request row; a failed `put`
/// must leave nothing behind.
#[tonic::async_trait]
pub trait BlobStore: Send + Sync + 'static {
    async fn put(&self, key: &str, content_type: &str, bytes: &[u8]) -> Result<String, BlobError>;

    async fn delete(&self, key: &str) -> Result<(), BlobError>;
}

/// Reject keys that could escape the store root.
pub fn validate_key(key: &str) -> Result<(), BlobError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|part| part.is_empty() || part == "." || part == "..");
    if bad {
        return Err(BlobError::InvalidKey(key.to_string()));
    }
    Ok(())
}
