//! The premium workflow: submission, lookup, and admin review.

use std::sync::Arc;

use clubhouse_core::config::PremiumConfig;
use clubhouse_core::db::unix_timestamp;
use clubhouse_core::premium::is_premium_active;
use clubhouse_core::{RequestState, RequestStatus};
use tracing::{info, warn};

use super::error::PremiumError;
use super::validate::{BankDetails, ProofUpload, rejection_reason};
use crate::auth::Identity;
use crate::blob::BlobStore;
use crate::storage::{
    Approval, ClubhouseDatabase, DatabaseError, NewPremiumRequest, PremiumRequest, User,
};

/// Upper bound on admin list page size.
const MAX_PAGE: u32 = 500;
const DEFAULT_PAGE: u32 = 100;

/// The caller's latest request and the UI state it selects.
#[derive(Debug, Clone)]
pub struct LatestRequest {
    pub state: RequestState,
    pub request: Option<PremiumRequest>,
}

/// A member's premium profile.
#[derive(Debug, Clone)]
pub struct Profile {
    pub user: User,
    pub premium_active: bool,
}

pub struct PremiumWorkflow {
    db: ClubhouseDatabase,
    blobs: Arc<dyn BlobStore>,
    limits: PremiumConfig,
}

impl PremiumWorkflow {
    pub fn new(db: ClubhouseDatabase, blobs: Arc<dyn BlobStore>, limits: PremiumConfig) -> Self {
        Self { db, blobs, limits }
    }

    /// Store the proof, then open a pending request referencing it.
    ///
    /// The row is only inserted after the upload succeeded. If the insert
    /// fails the uploaded blob is removed again.
    pub async fn submit(
        &self,
        who: &Identity,
        proof: ProofUpload<'_>,
        bank: &BankDetails,
    ) -> Result<PremiumRequest, PremiumError> {
        let bank = bank.normalized()?;
        let extension = proof.check(&self.limits)?;
        let user = self.account(who).await?;

        if self.db.has_pending_premium_request(&user.id).await? {
            return Err(PremiumError::AlreadyPending);
        }

        let request_id = uuid::Uuid::new_v4().to_string();
        let key = format!("proofs/{}/{request_id}.{extension}", user.id);

        let proof_url = self
            .blobs
            .put(&key, proof.content_type, proof.content)
            .await
            .map_err(|e| {
                warn!(error = %e, user_id = %user.id, "Payment proof upload failed");
                PremiumError::Upload(e)
            })?;

        let created = self
            .db
            .create_premium_request(&NewPremiumRequest {
                id: &request_id,
                user_id: &user.id,
                proof_url: &proof_url,
                bank_name: &bank.bank_name,
                account_number: &bank.account_number,
                account_holder: &bank.account_holder,
            })
            .await;

        match created {
            Ok(request) => {
                info!(
                    request_id = %request.id,
                    user_id = %user.id,
                    file_name = proof.file_name,
                    size = proof.content.len(),
                    "Premium request submitted"
                );
                Ok(request)
            }
            Err(e) => {
                if let Err(cleanup) = self.blobs.delete(&key).await {
                    warn!(error = %cleanup, key = %key, "Failed to remove orphaned payment proof");
                }
                match e {
                    DatabaseError::Conflict(_) => Err(PremiumError::AlreadyPending),
                    other => Err(other.into()),
                }
            }
        }
    }

    /// Latest request of the caller; never fails for members without one.
    pub async fn latest(&self, who: &Identity) -> Result<LatestRequest, PremiumError> {
        let request = self.db.latest_premium_request(&who.user_id).await?;
        let state = RequestState::from_latest(request.as_ref().map(|r| r.status));
        Ok(LatestRequest { state, request })
    }

    pub async fn profile(&self, who: &Identity) -> Result<Profile, PremiumError> {
        let user = self.account(who).await?;
        let premium_active = is_premium_active(user.premium_until, unix_timestamp());
        Ok(Profile {
            user,
            premium_active,
        })
    }

    /// Admin listing, newest first. Returns the page and the total count.
    pub async fn list(
        &self,
        who: &Identity,
        status_filter: Option<RequestStatus>,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<PremiumRequest>, i64), PremiumError> {
        self.require_admin(who).await?;

        let limit = match limit {
            0 => DEFAULT_PAGE,
            n => n.min(MAX_PAGE),
        };
        let requests = self
            .db
            .list_premium_requests(status_filter, limit, offset)
            .await?;
        let total = self.db.count_premium_requests(status_filter).await?;
        Ok((requests, total))
    }

    /// Approve a pending request and extend the owner's premium expiry.
    pub async fn approve(
        &self,
        who: &Identity,
        request_id: &str,
        owner_id: Option<&str>,
    ) -> Result<Approval, PremiumError> {
        self.require_admin(who).await?;

        let approval = self
            .db
            .approve_premium_request(
                request_id,
                owner_id,
                &who.user_id,
                self.limits.extension_months,
                unix_timestamp(),
            )
            .await?;

        info!(
            request_id,
            user_id = %approval.request.user_id,
            reviewer = %who.username,
            previous_until = ?approval.previous_until,
            premium_until = approval.premium_until,
            "Premium request approved"
        );
        Ok(approval)
    }

    /// Reject a pending request with a reason. The expiry is untouched.
    pub async fn reject(
        &self,
        who: &Identity,
        request_id: &str,
        reason: &str,
    ) -> Result<PremiumRequest, PremiumError> {
        self.require_admin(who).await?;
        let reason = rejection_reason(reason)?;

        let request = self
            .db
            .reject_premium_request(request_id, &reason, &who.user_id, unix_timestamp())
            .await?;

        info!(
            request_id,
            user_id = %request.user_id,
            reviewer = %who.username,
            "Premium request rejected"
        );
        Ok(request)
    }

    /// Resolve the caller's account; a token for a deleted account is treated
    /// as unauthenticated.
    async fn account(&self, who: &Identity) -> Result<User, PremiumError> {
        match self.db.get_user(&who.user_id).await {
            Ok(user) => Ok(user),
            Err(DatabaseError::NotFound(_)) => Err(PremiumError::Unauthenticated(
                "account no longer exists".into(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// The admin flag in the token is checked first, then confirmed against
    /// the account so a revoked role takes effect before the token expires.
    async fn require_admin(&self, who: &Identity) -> Result<(), PremiumError> {
        if !who.is_admin {
            return Err(PremiumError::PermissionDenied);
        }
        let user = self.account(who).await?;
        if !user.is_admin {
            return Err(PremiumError::PermissionDenied);
        }
        Ok(())
    }
}
