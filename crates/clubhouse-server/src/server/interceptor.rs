//! Bearer-token authentication at the gRPC boundary.

use std::sync::Arc;

use tonic::metadata::MetadataMap;
use tonic::{Request, Status};

use crate::auth::{Claims, Identity, JwtManager};

const BEARER: &str = "bearer ";

/// Interceptor for the member and admin services.
///
/// Accepts only access tokens. The decoded claims ride along in the request
/// extensions until the handler calls [`extract_identity`].
pub fn jwt_interceptor(
    jwt: Arc<JwtManager>,
) -> impl Fn(Request<()>) -> Result<Request<()>, Status> + Clone {
    move |mut req: Request<()>| {
        let claims = authenticate(&jwt, req.metadata())?;
        req.extensions_mut().insert(claims);
        Ok(req)
    }
}

#[allow(clippy::result_large_err)]
fn authenticate(jwt: &JwtManager, metadata: &MetadataMap) -> Result<Claims, Status> {
    let token = bearer_token(metadata)
        .ok_or_else(|| Status::unauthenticated("Missing bearer token"))?;

    match jwt.validate(token) {
        Ok(claims) if claims.is_access() => Ok(claims),
        Ok(_) => Err(Status::unauthenticated("Not an access token")),
        Err(_) => Err(Status::unauthenticated("Invalid token")),
    }
}

/// The token from an `authorization: Bearer <token>` header. The scheme is
/// matched case-insensitively.
fn bearer_token(metadata: &MetadataMap) -> Option<&str> {
    let value = metadata.get("authorization")?.to_str().ok()?;
    let (scheme, token) = value.split_at_checked(BEARER.len())?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case(BEARER) && !token.is_empty()).then_some(token)
}

/// The caller of a request that went through [`jwt_interceptor`].
#[allow(clippy::result_large_err)]
pub fn extract_identity<T>(req: &Request<T>) -> Result<Identity, Status> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| Status::unauthenticated("Authentication required"))?;
    Ok(Identity::from(claims))
}
