//! Shared test helpers for the workflow and gRPC service tests.

use std::sync::Arc;

use clubhouse_core::config::PremiumConfig;
use tempfile::TempDir;
use tonic::Request;

use crate::auth::{Claims, Identity, TokenKind};
use crate::blob::{BlobError, BlobStore, LocalBlobStore};
use crate::premium::{BankDetails, PremiumWorkflow, ProofUpload};
use crate::storage::{ClubhouseDatabase, NewPremiumRequest};

pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\nproof";

/// In-memory database with member `u1` ("alice") and admin `a1` ("root").
pub async fn seeded_db() -> ClubhouseDatabase {
    let db = ClubhouseDatabase::open_in_memory().await.unwrap();
    db.create_user("u1", "alice", "alice@example.com", "hash")
        .await
        .unwrap();
    db.create_user("a1", "root", "root@example.com", "hash")
        .await
        .unwrap();
    db.set_admin("root", true).await.unwrap();
    db
}

pub fn alice() -> Identity {
    Identity::new("u1", "alice", false)
}

pub fn admin() -> Identity {
    Identity::new("a1", "root", true)
}

/// Wrap a message in a request carrying the caller's access-token claims,
/// as the JWT interceptor would.
pub fn authed<T>(inner: T, who: &Identity) -> Request<T> {
    let mut req = Request::new(inner);
    req.extensions_mut().insert(Claims {
        jti: "test-jti".into(),
        sub: who.user_id.clone(),
        username: who.username.clone(),
        admin: who.is_admin,
        iat: 0,
        exp: i64::MAX,
        token_type: TokenKind::Access,
    });
    req
}

pub fn bank() -> BankDetails {
    BankDetails {
        bank_name: "Acme Bank".into(),
        account_number: "001-234-567".into(),
        account_holder: "Alice Liddell".into(),
    }
}

pub fn png_proof() -> ProofUpload<'static> {
    ProofUpload {
        file_name: "receipt.png",
        content_type: "image/png",
        content: PNG,
    }
}

/// Workflow backed by a temp-dir blob store. Keep the `TempDir` alive for
/// the duration of the test.
pub fn local_workflow(db: ClubhouseDatabase) -> (Arc<PremiumWorkflow>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let blobs = Arc::new(LocalBlobStore::new(dir.path()));
    let workflow = Arc::new(PremiumWorkflow::new(db, blobs, PremiumConfig::default()));
    (workflow, dir)
}

/// Blob store whose uploads always fail.
pub struct FailingBlobStore;

#[tonic::async_trait]
impl BlobStore for FailingBlobStore {
    async fn put(
        &self,
        _key: &str,
        _content_type: &str,
        _bytes: &[u8],
    ) -> Result<String, BlobError> {
        Err(BlobError::Unavailable("bucket offline".into()))
    }

    async fn delete(&self, _key: &str) -> Result<(), BlobError> {
        Ok(())
    }
}

pub fn failing_workflow(db: ClubhouseDatabase) -> Arc<PremiumWorkflow> {
    Arc::new(PremiumWorkflow::new(
        db,
        Arc::new(FailingBlobStore),
        PremiumConfig::default(),
    ))
}

/// Local store that opens a rival pending request for `user_id` while an
/// upload is in flight, so the uploader's own insert hits the unique index.
pub struct ContendedBlobStore {
    inner: LocalBlobStore,
    db: ClubhouseDatabase,
    user_id: &'static str,
}

#[tonic::async_trait]
impl BlobStore for ContendedBlobStore {
    async fn put(&self, key: &str, content_type: &str, bytes: &[u8]) -> Result<String, BlobError> {
        let url = self.inner.put(key, content_type, bytes).await?;
        self.db
            .create_premium_request(&NewPremiumRequest {
                id: "rival",
                user_id: self.user_id,
                proof_url: "proofs/rival.png",
                bank_name: "Other Bank",
                account_number: "999",
                account_holder: "Someone Else",
            })
            .await
            .map_err(|e| BlobError::Unavailable(e.to_string()))?;
        Ok(url)
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        self.inner.delete(key).await
    }
}

pub fn contended_workflow(
    db: ClubhouseDatabase,
    user_id: &'static str,
) -> (Arc<PremiumWorkflow>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let blobs = Arc::new(ContendedBlobStore {
        inner: LocalBlobStore::new(dir.path()),
        db: db.clone(),
        user_id,
    });
    let workflow = Arc::new(PremiumWorkflow::new(db, blobs, PremiumConfig::default()));
    (workflow, dir)
}

/// Number of files stored under a blob root.
pub fn stored_files(dir: &TempDir) -> usize {
    fn walk(path: &std::path::Path) -> usize {
        std::fs::read_dir(path).map_or(0, |entries| {
            entries
                .filter_map(Result::ok)
                .map(|e| {
                    let p = e.path();
                    if p.is_dir() { walk(&p) } else { 1 }
                })
                .sum()
        })
    }
    walk(dir.path())
}
