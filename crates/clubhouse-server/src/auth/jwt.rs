//! HS256 token signing.

use clubhouse_core::db::unix_timestamp;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sha2::{Digest, Sha256};

use super::claims::{Claims, TokenKind};

/// Who a token is issued to.
#[derive(Debug, Clone, Copy)]
pub struct Subject<'a> {
    pub user_id: &'a str,
    pub username: &'a str,
    pub admin: bool,
}

impl<'a> Subject<'a> {
    pub const fn new(user_id: &'a str, username: &'a str, admin: bool) -> Self {
        Self {
            user_id,
            username,
            admin,
        }
    }
}

/// A signed token and when it stops being valid.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
    pub ttl_secs: i64,
}

pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl JwtManager {
    pub fn new(secret: &[u8], access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    const fn ttl(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::Access => self.access_ttl_secs,
            TokenKind::Refresh => self.refresh_ttl_secs,
        }
    }

    /// Sign a fresh token of the given kind. Every token gets its own `jti`,
    /// so two tokens issued in the same second still differ.
    pub fn issue(
        &self,
        kind: TokenKind,
        subject: &Subject<'_>,
    ) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
        let ttl_secs = self.ttl(kind);
        let iat = unix_timestamp();
        let claims = Claims {
            jti: uuid::Uuid::new_v4().to_string(),
            sub: subject.user_id.to_owned(),
            username: subject.username.to_owned(),
            admin: subject.admin,
            iat,
            exp: iat + ttl_secs,
            token_type: kind,
        };

        let token =
            jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
            ttl_secs,
        })
    }

    /// Check signature and expiry.
    pub fn validate(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
    }

    /// Hex SHA-256 of a refresh token; only this digest is persisted.
    pub fn hash_token(token: &str) -> String {
        Sha256::digest(token.as_bytes())
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}
