//! Account and refresh-token queries.

use clubhouse_core::db::unix_timestamp;

use super::db::{ClubhouseDatabase, DatabaseError};
use super::models::{Token, User};

/// Unique column a user is looked up by.
#[derive(Clone, Copy)]
enum UserKey<'a> {
    Id(&'a str),
    Username(&'a str),
}

impl<'a> UserKey<'a> {
    const fn sql(self) -> &'static str {
        match self {
            Self::Id(_) => "SELECT * FROM users WHERE id = ?",
            Self::Username(_) => "SELECT * FROM users WHERE username = ?",
        }
    }

    const fn column(self) -> &'static str {
        match self {
            Self::Id(_) => "id",
            Self::Username(_) => "username",
        }
    }

    const fn bound(self) -> &'a str {
        match self {
            Self::Id(v) | Self::Username(v) => v,
        }
    }
}

impl ClubhouseDatabase {
    /// Insert an account. New accounts are neither admin nor premium.
    /// A taken username is `DatabaseError::Conflict`.
    pub async fn create_user(
        &self,
        id: &str,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, DatabaseError> {
        let now = unix_timestamp();
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, username, email, password_hash, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?5) RETURNING *",
        )
        .bind(id)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(now)
        .fetch_one(self.pool())
        .await?;
        Ok(user)
    }

    pub async fn get_user(&self, id: &str) -> Result<User, DatabaseError> {
        self.find_user(UserKey::Id(id)).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<User, DatabaseError> {
        self.find_user(UserKey::Username(username)).await
    }

    async fn find_user(&self, key: UserKey<'_>) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>(key.sql())
            .bind(key.bound())
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| {
                DatabaseError::NotFound(format!("user with {} {}", key.column(), key.bound()))
            })
    }

    /// Set or clear the admin flag of an existing account.
    pub async fn set_admin(&self, username: &str, is_admin: bool) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET is_admin = ?1, updated_at = ?2 WHERE username = ?3 RETURNING *",
        )
        .bind(is_admin)
        .bind(unix_timestamp())
        .bind(username)
        .fetch_optional(self.pool())
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("user with username {username}")))
    }

    /// Remember a refresh token by its digest.
    pub async fn create_token(
        &self,
        id: &str,
        user_id: &str,
        token_hash: &str,
        expires_at: i64,
    ) -> Result<Token, DatabaseError> {
        let token = sqlx::query_as::<_, Token>(
            "INSERT INTO tokens (id, user_id, token_hash, expires_at, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5) RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .bind(unix_timestamp())
        .fetch_one(self.pool())
        .await?;
        Ok(token)
    }

    /// The token with this digest, unless it is revoked or past its expiry.
    pub async fn live_token(&self, token_hash: &str) -> Result<Option<Token>, DatabaseError> {
        Ok(sqlx::query_as::<_, Token>(
            "SELECT * FROM tokens WHERE token_hash = ?1 AND revoked = 0 AND expires_at > ?2",
        )
        .bind(token_hash)
        .bind(unix_timestamp())
        .fetch_optional(self.pool())
        .await?)
    }

    /// Mark a token revoked. Only the first caller gets `true`, which makes
    /// refresh rotation single-use under concurrency.
    pub async fn revoke_token(&self, id: &str) -> Result<bool, DatabaseError> {
        let done = sqlx::query("UPDATE tokens SET revoked = 1 WHERE id = ?1 AND revoked = 0")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(done.rows_affected() == 1)
    }
}
