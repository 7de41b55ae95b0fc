use std::sync::Arc;

use tonic::{Code, Request, Status};

use clubhouse_proto::v1::auth_service_server::AuthService;
use clubhouse_proto::v1::{
    LoginRequest, LoginResponse, RefreshTokenRequest, RefreshTokenResponse, RegisterRequest,
    RegisterResponse, RevokeTokenRequest,
};

use super::auth_svc::AuthServiceImpl;
use crate::auth::JwtManager;
use crate::storage::ClubhouseDatabase;

const PASSWORD: &str = "correct horse";

struct Fixture {
    svc: AuthServiceImpl,
    db: ClubhouseDatabase,
    jwt: Arc<JwtManager>,
}

impl Fixture {
    async fn new() -> Self {
        let db = ClubhouseDatabase::open_in_memory().await.unwrap();
        let jwt = Arc::new(JwtManager::new(b"auth-svc-secret", 600, 7200));
        let svc = AuthServiceImpl::new(db.clone(), Arc::clone(&jwt));
        Self { svc, db, jwt }
    }

    async fn register(&self, username: &str, password: &str) -> Result<RegisterResponse, Status> {
        self.svc
            .register(Request::new(RegisterRequest {
                username: username.into(),
                password: password.into(),
                email: format!("{}@club.test", username.trim()),
            }))
            .await
            .map(tonic::Response::into_inner)
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, Status> {
        self.svc
            .login(Request::new(LoginRequest {
                username: username.into(),
                password: password.into(),
            }))
            .await
            .map(tonic::Response::into_inner)
    }

    async fn refresh(&self, token: &str) -> Result<RefreshTokenResponse, Status> {
        self.svc
            .refresh_token(Request::new(RefreshTokenRequest {
                refresh_token: token.into(),
            }))
            .await
            .map(tonic::Response::into_inner)
    }

    async fn revoke(&self, token: &str) -> bool {
        self.svc
            .revoke_token(Request::new(RevokeTokenRequest {
                refresh_token: token.into(),
            }))
            .await
            .unwrap()
            .into_inner()
            .revoked
    }
}

#[tokio::test]
async fn registered_member_can_sign_in() {
    let fx = Fixture::new().await;
    let reg = fx.register("marta", PASSWORD).await.unwrap();

    assert_eq!(reg.expires_in_secs, 600);
    let claims = fx.jwt.validate(&reg.access_token).unwrap();
    assert!(claims.is_access());
    assert_eq!(claims.sub, reg.user_id);
    assert!(!claims.admin);

    let login = fx.login("marta", PASSWORD).await.unwrap();
    assert_eq!(login.user_id, reg.user_id);
    assert!(fx.jwt.validate(&login.refresh_token).unwrap().is_refresh());
}

#[tokio::test]
async fn registration_rejects_short_fields() {
    let fx = Fixture::new().await;

    for (username, password) in [(" ab ", PASSWORD), ("marta", "seven77")] {
        let err = fx.register(username, password).await.unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument, "{username:?}/{password:?}");
    }
    assert!(fx.db.get_user_by_username("marta").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn username_is_taken_once() {
    let fx = Fixture::new().await;
    fx.register("marta", PASSWORD).await.unwrap();

    let err = fx.register("  marta ", "another password").await.unwrap_err();
    assert_eq!(err.code(), Code::AlreadyExists);
}

#[tokio::test]
async fn bad_credentials_look_the_same() {
    let fx = Fixture::new().await;
    fx.register("marta", PASSWORD).await.unwrap();

    let wrong_password = fx.login("marta", "incorrect horse").await.unwrap_err();
    let unknown_user = fx.login("nobody", PASSWORD).await.unwrap_err();

    assert_eq!(wrong_password.code(), Code::Unauthenticated);
    assert_eq!(unknown_user.code(), Code::Unauthenticated);
    assert_eq!(wrong_password.message(), unknown_user.message());
}

#[tokio::test]
async fn promoted_member_gets_admin_claim_on_login() {
    let fx = Fixture::new().await;
    fx.register("marta", PASSWORD).await.unwrap();
    fx.db.set_admin("marta", true).await.unwrap();

    let login = fx.login("marta", PASSWORD).await.unwrap();
    assert!(fx.jwt.validate(&login.access_token).unwrap().admin);
}

#[tokio::test]
async fn refresh_spends_the_presented_token() {
    let fx = Fixture::new().await;
    let reg = fx.register("marta", PASSWORD).await.unwrap();

    let rotated = fx.refresh(&reg.refresh_token).await.unwrap();
    assert_ne!(rotated.refresh_token, reg.refresh_token);
    assert_eq!(rotated.expires_in_secs, 600);

    let replay = fx.refresh(&reg.refresh_token).await.unwrap_err();
    assert_eq!(replay.code(), Code::Unauthenticated);

    // The rotated token is still good.
    fx.refresh(&rotated.refresh_token).await.unwrap();
}

#[tokio::test]
async fn refresh_reflects_current_admin_flag() {
    let fx = Fixture::new().await;
    let reg = fx.register("marta", PASSWORD).await.unwrap();
    fx.db.set_admin("marta", true).await.unwrap();

    let rotated = fx.refresh(&reg.refresh_token).await.unwrap();
    assert!(fx.jwt.validate(&rotated.access_token).unwrap().admin);
}

#[tokio::test]
async fn refresh_refuses_access_tokens_and_garbage() {
    let fx = Fixture::new().await;
    let reg = fx.register("marta", PASSWORD).await.unwrap();

    let access = fx.refresh(&reg.access_token).await.unwrap_err();
    assert_eq!(access.code(), Code::InvalidArgument);

    let garbage = fx.refresh("not-a-jwt").await.unwrap_err();
    assert_eq!(garbage.code(), Code::Unauthenticated);
}

#[tokio::test]
async fn revocation_is_reported_once() {
    let fx = Fixture::new().await;
    let reg = fx.register("marta", PASSWORD).await.unwrap();

    assert!(fx.revoke(&reg.refresh_token).await);
    assert!(!fx.revoke(&reg.refresh_token).await);
    assert!(!fx.revoke("never-issued").await);

    let err = fx.refresh(&reg.refresh_token).await.unwrap_err();
    assert_eq!(err.code(), Code::Unauthenticated);
}

#[tokio::test]
async fn storage_failures_are_not_leaked() {
    let fx = Fixture::new().await;
    sqlx::query("DROP TABLE tokens")
        .execute(fx.db.pool())
        .await
        .unwrap();

    let err = fx.register("marta", PASSWORD).await.unwrap_err();
    assert_eq!(err.code(), Code::Internal);
    assert_eq!(err.message(), "Internal error");
}
