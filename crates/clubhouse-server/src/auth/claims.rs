//! JWT claims structure.

use serde::{Deserialize, Serialize};

/// Kind of token a set of claims was issued as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims embedded in access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// JWT ID (unique per token).
    pub jti: String,
    /// Subject (user ID).
    pub sub: String,
    pub username: String,
    /// Admin role at issue time.
    #[serde(default)]
    pub admin: bool,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
    pub token_type: TokenKind,
}

impl Claims {
    pub fn is_access(&self) -> bool {
        self.token_type == TokenKind::Access
    }

    pub fn is_refresh(&self) -> bool {
        self.token_type == TokenKind::Refresh
    }
}
