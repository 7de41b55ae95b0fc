//! Authenticated caller identity.

use super::claims::Claims;

/// Who is calling, resolved once at the request boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub username: String,
    pub is_admin: bool,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, username: impl Into<String>, is_admin: bool) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            is_admin,
        }
    }
}

impl From<&Claims> for Identity {
    fn from(claims: &Claims) -> Self {
        Self::new(claims.sub.clone(), claims.username.clone(), claims.admin)
    }
}
