//! Data models for Clubhouse storage.

use clubhouse_core::RequestStatus;
use serde::{Deserialize, Serialize};

/// An account together with its premium profile.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    /// Premium expiry (unix seconds); `None` if never premium.
    pub premium_until: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Token {
    pub id: String,
    pub user_id: String,
    pub token_hash: String,
    pub expires_at: i64,
    pub revoked: i64,
    pub created_at: i64,
}

/// A member's claim of payment.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PremiumRequest {
    pub id: String,
    pub user_id: String,
    pub proof_url: String,
    pub bank_name: String,
    pub account_number: String,
    pub account_holder: String,
    pub status: RequestStatus,
    pub notes: Option<String>,
    pub created_at: i64,
    pub reviewed_at: Option<i64>,
    pub reviewed_by: Option<String>,
}
