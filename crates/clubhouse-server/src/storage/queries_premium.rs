//! Premium request queries.
//!
//! Status changes are compare-and-set updates (`WHERE status = 'pending'`):
//! a request is resolved at most once no matter how many reviewers race.

use clubhouse_core::RequestStatus;
use clubhouse_core::db::unix_timestamp;
use clubhouse_core::premium::extend_premium;
use sqlx::{Sqlite, Transaction};

use super::db::{ClubhouseDatabase, DatabaseError};
use super::models::PremiumRequest;

/// Parameters for opening a premium request.
pub struct NewPremiumRequest<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub proof_url: &'a str,
    pub bank_name: &'a str,
    pub account_number: &'a str,
    pub account_holder: &'a str,
}

/// Result of a committed approval.
#[derive(Debug, Clone)]
pub struct Approval {
    pub request: PremiumRequest,
    /// Previous `premium_until` of the owner.
    pub previous_until: Option<i64>,
    /// New `premium_until` of the owner.
    pub premium_until: i64,
}

/// Why a review transition was refused.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("Premium request {0} not found")]
    NotFound(String),

    #[error("Premium request {id} is already {status}")]
    NotPending { id: String, status: RequestStatus },

    #[error("Premium request {id} does not belong to user {user_id}")]
    OwnerMismatch { id: String, user_id: String },

    #[error(transparent)]
    Expiry(#[from] clubhouse_core::Error),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for ReviewError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(e.into())
    }
}

impl ClubhouseDatabase {
    /// Insert a new request in `pending` state.
    ///
    /// Fails with `DatabaseError::Conflict` if the user already has a pending
    /// request.
    pub async fn create_premium_request(
        &self,
        params: &NewPremiumRequest<'_>,
    ) -> Result<PremiumRequest, DatabaseError> {
        sqlx::query(
            "INSERT INTO premium_requests \
             (id, user_id, proof_url, bank_name, account_number, account_holder, \
              status, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(params.id)
        .bind(params.user_id)
        .bind(params.proof_url)
        .bind(params.bank_name)
        .bind(params.account_number)
        .bind(params.account_holder)
        .bind(RequestStatus::Pending)
        .bind(unix_timestamp())
        .execute(self.pool())
        .await?;

        self.get_premium_request(params.id).await
    }

    /// Get a request by ID.
    pub async fn get_premium_request(&self, id: &str) -> Result<PremiumRequest, DatabaseError> {
        sqlx::query_as::<_, PremiumRequest>("SELECT * FROM premium_requests WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Premium request {id}")))
    }

    /// Most recent request of a user, if any.
    pub async fn latest_premium_request(
        &self,
        user_id: &str,
    ) -> Result<Option<PremiumRequest>, DatabaseError> {
        let request = sqlx::query_as::<_, PremiumRequest>(
            "SELECT * FROM premium_requests WHERE user_id = ? \
             ORDER BY created_at DESC, seq DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(request)
    }

    /// Whether the user has a request awaiting review.
    pub async fn has_pending_premium_request(&self, user_id: &str) -> Result<bool, DatabaseError> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM premium_requests WHERE user_id = ? AND status = ?",
        )
        .bind(user_id)
        .bind(RequestStatus::Pending)
        .fetch_one(self.pool())
        .await?;

        Ok(row.0 > 0)
    }

    /// List requests newest first, optionally filtered by status.
    pub async fn list_premium_requests(
        &self,
        status_filter: Option<RequestStatus>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<PremiumRequest>, DatabaseError> {
        let requests = if let Some(status) = status_filter {
            sqlx::query_as::<_, PremiumRequest>(
                "SELECT * FROM premium_requests WHERE status = ? \
                 ORDER BY created_at DESC, seq DESC LIMIT ? OFFSET ?",
            )
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool())
            .await?
        } else {
            sqlx::query_as::<_, PremiumRequest>(
                "SELECT * FROM premium_requests \
                 ORDER BY created_at DESC, seq DESC LIMIT ? OFFSET ?",
            )
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool())
            .await?
        };

        Ok(requests)
    }

    /// Count requests, optionally filtered by status.
    pub async fn count_premium_requests(
        &self,
        status_filter: Option<RequestStatus>,
    ) -> Result<i64, DatabaseError> {
        let row: (i64,) = if let Some(status) = status_filter {
            sqlx::query_as("SELECT COUNT(*) FROM premium_requests WHERE status = ?")
                .bind(status)
                .fetch_one(self.pool())
                .await?
        } else {
            sqlx::query_as("SELECT COUNT(*) FROM premium_requests")
                .fetch_one(self.pool())
                .await?
        };

        Ok(row.0)
    }

    /// Approve a pending request and extend its owner's premium expiry.
    ///
    /// Both writes happen in one transaction. The status update runs first so
    /// the transaction takes the write lock before reading the expiry; a
    /// concurrent approval of the same request then sees zero affected rows
    /// and gets `ReviewError::NotPending`.
    ///
    /// When `expected_user` is given it must match the request owner.
    pub async fn approve_premium_request(
        &self,
        id: &str,
        expected_user: Option<&str>,
        reviewer_id: &str,
        extension_months: u32,
        now: i64,
    ) -> Result<Approval, ReviewError> {
        let mut tx = self.pool().begin().await?;

        let updated = sqlx::query(
            "UPDATE premium_requests SET status = ?, reviewed_at = ?, reviewed_by = ? \
             WHERE id = ? AND status = ? AND (? IS NULL OR user_id = ?)",
        )
        .bind(RequestStatus::Approved)
        .bind(now)
        .bind(reviewer_id)
        .bind(id)
        .bind(RequestStatus::Pending)
        .bind(expected_user)
        .bind(expected_user)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let err =
                refused_transition(&mut tx, id, RequestStatus::Approved, expected_user).await;
            tx.rollback().await?;
            return Err(err);
        }

        let user_id =
            sqlx::query_scalar::<_, String>("SELECT user_id FROM premium_requests WHERE id = ?")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        let previous_until =
            sqlx::query_scalar::<_, Option<i64>>("SELECT premium_until FROM users WHERE id = ?")
                .bind(&user_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DatabaseError::NotFound(format!("User {user_id}")))?;

        let premium_until = extend_premium(previous_until, now, extension_months)?;

        sqlx::query("UPDATE users SET premium_until = ?, updated_at = ? WHERE id = ?")
            .bind(premium_until)
            .bind(now)
            .bind(&user_id)
            .execute(&mut *tx)
            .await?;

        let request =
            sqlx::query_as::<_, PremiumRequest>("SELECT * FROM premium_requests WHERE id = ?")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;

        Ok(Approval {
            request,
            previous_until,
            premium_until,
        })
    }

    /// Reject a pending request, recording the reason in `notes`.
    pub async fn reject_premium_request(
        &self,
        id: &str,
        reason: &str,
        reviewer_id: &str,
        now: i64,
    ) -> Result<PremiumRequest, ReviewError> {
        let mut tx = self.pool().begin().await?;

        let updated = sqlx::query(
            "UPDATE premium_requests SET status = ?, notes = ?, reviewed_at = ?, reviewed_by = ? \
             WHERE id = ? AND status = ?",
        )
        .bind(RequestStatus::Rejected)
        .bind(reason)
        .bind(now)
        .bind(reviewer_id)
        .bind(id)
        .bind(RequestStatus::Pending)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let err = refused_transition(&mut tx, id, RequestStatus::Rejected, None).await;
            tx.rollback().await?;
            return Err(err);
        }

        let request =
            sqlx::query_as::<_, PremiumRequest>("SELECT * FROM premium_requests WHERE id = ?")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;
        Ok(request)
    }
}

/// Explain why a conditional status update touched no rows.
async fn refused_transition(
    tx: &mut Transaction<'_, Sqlite>,
    id: &str,
    target: RequestStatus,
    expected_user: Option<&str>,
) -> ReviewError {
    let row = sqlx::query_as::<_, (String, RequestStatus)>(
        "SELECT user_id, status FROM premium_requests WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await;

    match row {
        Ok(None) => ReviewError::NotFound(id.to_string()),
        Ok(Some((_, status))) if !status.can_transition_to(target) => ReviewError::NotPending {
            id: id.to_string(),
            status,
        },
        Ok(Some((owner, _))) => match expected_user {
            Some(expected) if expected != owner => ReviewError::OwnerMismatch {
                id: id.to_string(),
                user_id: expected.to_string(),
            },
            // Still pending and owned as expected: the update raced with a
            // concurrent writer. Report it as a lost transition.
            _ => ReviewError::NotPending {
                id: id.to_string(),
                status: RequestStatus::Pending,
            },
        },
        Err(e) => e.into(),
    }
}
