//! `AuthService` gRPC implementation.

use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::{info, instrument, warn};

use clubhouse_proto::v1::auth_service_server::AuthService;
use clubhouse_proto::v1::{
    LoginRequest, LoginResponse, RefreshTokenRequest, RefreshTokenResponse, RegisterRequest,
    RegisterResponse, RevokeTokenRequest, RevokeTokenResponse,
};

use crate::auth::password::{MIN_PASSWORD_LEN, hash_password, verify_password};
use crate::auth::{IssuedToken, JwtManager, Subject, TokenKind};
use crate::storage::{ClubhouseDatabase, DatabaseError, User};

const MIN_USERNAME_LEN: usize = 3;
const STALE_REFRESH: &str = "Refresh token revoked or expired";

pub struct AuthServiceImpl {
    db: ClubhouseDatabase,
    jwt: Arc<JwtManager>,
}

/// Log a failure with the step it happened in and hide it from the caller.
fn internal<E: std::fmt::Display>(step: &'static str) -> impl FnOnce(E) -> Status {
    move |e| {
        warn!(error = %e, step, "Auth service internal error");
        Status::internal("Internal error")
    }
}

/// Trimmed username and raw password of an acceptable registration.
#[allow(clippy::result_large_err)]
fn registration(req: &RegisterRequest) -> Result<(&str, &str), Status> {
    let username = req.username.trim();
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(Status::invalid_argument(format!(
            "Username must be at least {MIN_USERNAME_LEN} characters"
        )));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Status::invalid_argument(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok((username, &req.password))
}

impl AuthServiceImpl {
    pub const fn new(db: ClubhouseDatabase, jwt: Arc<JwtManager>) -> Self {
        Self { db, jwt }
    }

    /// Sign an access/refresh pair for `user` and persist the refresh digest.
    /// The admin claim reflects the account as stored right now.
    #[allow(clippy::result_large_err)]
    async fn sign_in(&self, user: &User) -> Result<(IssuedToken, IssuedToken), Status> {
        let subject = Subject::new(&user.id, &user.username, user.is_admin);
        let sign = |kind| {
            self.jwt
                .issue(kind, &subject)
                .map_err(internal("Token signing"))
        };
        let access = sign(TokenKind::Access)?;
        let refresh = sign(TokenKind::Refresh)?;

        self.db
            .create_token(
                &uuid::Uuid::new_v4().to_string(),
                &user.id,
                &JwtManager::hash_token(&refresh.token),
                refresh.expires_at,
            )
            .await
            .map_err(internal("Token storage"))?;

        Ok((access, refresh))
    }
}

#[tonic::async_trait]
impl AuthService for AuthServiceImpl {
    #[instrument(skip(self, request), fields(rpc = "Register"))]
    async fn register(
        &self,
        request: Request<RegisterRequest>,
    ) -> Result<Response<RegisterResponse>, Status> {
        let req = request.into_inner();
        let (username, password) = registration(&req)?;

        let password_hash = hash_password(password).map_err(internal("Password hashing"))?;

        // The unique index on `username` settles concurrent sign-ups.
        let user = match self
            .db
            .create_user(
                &uuid::Uuid::new_v4().to_string(),
                username,
                req.email.trim(),
                &password_hash,
            )
            .await
        {
            Ok(user) => user,
            Err(DatabaseError::Conflict(_)) => {
                return Err(Status::already_exists("Username already taken"));
            }
            Err(e) => return Err(internal("User creation")(e)),
        };

        let (access, refresh) = self.sign_in(&user).await?;
        info!(user_id = %user.id, username = %user.username, "Account registered");

        Ok(Response::new(RegisterResponse {
            user_id: user.id,
            access_token: access.token,
            refresh_token: refresh.token,
            expires_in_secs: access.ttl_secs,
        }))
    }

    #[instrument(skip(self, request), fields(rpc = "Login"))]
    async fn login(
        &self,
        request: Request<LoginRequest>,
    ) -> Result<Response<LoginResponse>, Status> {
        let LoginRequest { username, password } = request.into_inner();

        let user = match self.db.get_user_by_username(username.trim()).await {
            Ok(user) => Some(user),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(internal("User lookup")(e)),
        };

        let verified = match &user {
            Some(user) => verify_password(&password, &user.password_hash)
                .map_err(internal("Password verification"))?,
            None => false,
        };
        let Some(user) = user.filter(|_| verified) else {
            warn!(username = %username, "Rejected login");
            return Err(Status::unauthenticated("Invalid credentials"));
        };

        let (access, refresh) = self.sign_in(&user).await?;
        info!(user_id = %user.id, admin = user.is_admin, "Signed in");

        Ok(Response::new(LoginResponse {
            access_token: access.token,
            refresh_token: refresh.token,
            expires_in_secs: access.ttl_secs,
            user_id: user.id,
        }))
    }

    /// Rotate a refresh token. The presented token is spent even if the
    /// account lookup afterwards fails.
    #[instrument(skip(self, request), fields(rpc = "RefreshToken"))]
    async fn refresh_token(
        &self,
        request: Request<RefreshTokenRequest>,
    ) -> Result<Response<RefreshTokenResponse>, Status> {
        let presented = request.into_inner().refresh_token;

        let claims = self
            .jwt
            .validate(&presented)
            .map_err(|_| Status::unauthenticated("Invalid refresh token"))?;
        if !claims.is_refresh() {
            return Err(Status::invalid_argument("Not a refresh token"));
        }

        let stored = self
            .db
            .live_token(&JwtManager::hash_token(&presented))
            .await
            .map_err(internal("Token lookup"))?
            .ok_or_else(|| Status::unauthenticated(STALE_REFRESH))?;

        // A concurrent refresh with the same token may have spent it first.
        let spent_here = self
            .db
            .revoke_token(&stored.id)
            .await
            .map_err(internal("Token revocation"))?;
        if !spent_here {
            return Err(Status::unauthenticated(STALE_REFRESH));
        }

        let user = match self.db.get_user(&claims.sub).await {
            Ok(user) => user,
            Err(e) if e.is_not_found() => {
                return Err(Status::unauthenticated("Account no longer exists"));
            }
            Err(e) => return Err(internal("User lookup")(e)),
        };

        let (access, refresh) = self.sign_in(&user).await?;

        Ok(Response::new(RefreshTokenResponse {
            access_token: access.token,
            refresh_token: refresh.token,
            expires_in_secs: access.ttl_secs,
        }))
    }

    #[instrument(skip(self, request), fields(rpc = "RevokeToken"))]
    async fn revoke_token(
        &self,
        request: Request<RevokeTokenRequest>,
    ) -> Result<Response<RevokeTokenResponse>, Status> {
        let digest = JwtManager::hash_token(&request.into_inner().refresh_token);

        let revoked = match self
            .db
            .live_token(&digest)
            .await
            .map_err(internal("Token lookup"))?
        {
            Some(token) => self
                .db
                .revoke_token(&token.id)
                .await
                .map_err(internal("Revocation"))?,
            None => false,
        };

        Ok(Response::new(RevokeTokenResponse { revoked }))
    }
}
