//! Route guard for protected endpoints.
//!
//! Every protected request walks the same ordered steps:
//!
//! ```text
//! Unchecked --authenticate--> Authenticated --authorize(Admin)--> Authorized
//!     |                            |
//!     +--> Unauthorized (401)      +--> Forbidden (403)
//! ```
//!
//! `authenticate_user` and `is_admin` are the axum middleware wrappers around
//! those steps. Layer `is_admin` inside `authenticate_user` so that an
//! unauthenticated caller never reaches the role check.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use super::{claims::Identity, jwt::JwtKeys};
use crate::{error::AuthError, state::AppState};

/// What a route demands of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Authenticated,
    Admin,
}

/// Unchecked -> Authenticated. Resolves the bearer token into an identity.
pub fn authenticate(headers: &HeaderMap, keys: &JwtKeys) -> Result<Identity, AuthError> {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::Unauthorized("Missing Authorization header"))?;

    let token = auth
        .strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .ok_or(AuthError::Unauthorized("Invalid Authorization header"))?;

    let claims = keys.verify(token.trim()).map_err(|e| {
        warn!(error = %e, "invalid or expired token");
        AuthError::Unauthorized("Invalid or expired token")
    })?;

    Ok(Identity::from(claims))
}

/// Authenticated -> Authorized. Only meaningful after `authenticate`.
pub fn authorize(identity: &Identity, requirement: Requirement) -> Result<(), AuthError> {
    match requirement {
        Requirement::Authenticated => Ok(()),
        Requirement::Admin if identity.is_admin() => Ok(()),
        Requirement::Admin => {
            warn!(user_id = identity.user_id, "admin route refused");
            Err(AuthError::Forbidden)
        }
    }
}

/// Both steps in order.
pub fn check(
    headers: &HeaderMap,
    keys: &JwtKeys,
    requirement: Requirement,
) -> Result<Identity, AuthError> {
    let identity = authenticate(headers, keys)?;
    authorize(&identity, requirement)?;
    Ok(identity)
}

/// Verifies the identity marker and attaches the `Identity` to the request.
pub async fn authenticate_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = check(req.headers(), &state.keys, Requirement::Authenticated)?;
    debug!(user_id = identity.user_id, email = %identity.email, "request authenticated");
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Lets the request through only for admins. Must run after `authenticate_user`.
pub async fn is_admin(req: Request, next: Next) -> Result<Response, AuthError> {
    let identity = req
        .extensions()
        .get::<Identity>()
        .ok_or(AuthError::Unauthorized("Authentication required"))?;
    authorize(identity, Requirement::Admin)?;
    Ok(next.run(req).await)
}
