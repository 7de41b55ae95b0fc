//! Premium workflow errors and their gRPC mapping.

use clubhouse_core::RequestStatus;
use tonic::Status;
use tracing::warn;

use crate::blob::BlobError;
use crate::storage::{DatabaseError, ReviewError};

#[derive(Debug, thiserror::Error)]
pub enum PremiumError {
    #[error("Authentication required: {0}")]
    Unauthenticated(String),

    #[error("Admin role required")]
    PermissionDenied,

    #[error("{0}")]
    InvalidArgument(String),

    #[error("A premium request is already awaiting review")]
    AlreadyPending,

    #[error("Premium request {0} not found")]
    NotFound(String),

    #[error("Premium request {id} is already {status}")]
    InvalidState { id: String, status: RequestStatus },

    #[error("Proof upload failed: {0}")]
    Upload(#[from] BlobError),

    #[error("Expiry computation failed: {0}")]
    Expiry(#[from] clubhouse_core::Error),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<ReviewError> for PremiumError {
    fn from(e: ReviewError) -> Self {
        match e {
            ReviewError::NotFound(id) => Self::NotFound(id),
            ReviewError::NotPending { id, status } => Self::InvalidState { id, status },
            ReviewError::OwnerMismatch { id, user_id } => Self::InvalidArgument(format!(
                "Premium request {id} does not belong to user {user_id}"
            )),
            ReviewError::Expiry(e) => Self::Expiry(e),
            ReviewError::Database(e) => Self::Database(e),
        }
    }
}

impl From<PremiumError> for Status {
    fn from(e: PremiumError) -> Self {
        match e {
            PremiumError::Unauthenticated(_) => Self::unauthenticated(e.to_string()),
            PremiumError::PermissionDenied => Self::permission_denied(e.to_string()),
            PremiumError::InvalidArgument(msg) => Self::invalid_argument(msg),
            PremiumError::AlreadyPending | PremiumError::InvalidState { .. } => {
                Self::failed_precondition(e.to_string())
            }
            PremiumError::NotFound(_) => Self::not_found(e.to_string()),
            PremiumError::Upload(BlobError::Io(_) | BlobError::Unavailable(_)) => {
                Self::unavailable(e.to_string())
            }
            PremiumError::Upload(BlobError::InvalidKey(_))
            | PremiumError::Expiry(_)
            | PremiumError::Database(_) => {
                warn!(error = %e, "Premium workflow internal error");
                Self::internal("Internal error")
            }
        }
    }
}
