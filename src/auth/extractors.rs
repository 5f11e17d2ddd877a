use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use tracing::warn;

use super::claims::Identity;
use crate::error::AuthError;

/// The identity `authenticate_user` attached to this request.
pub struct AuthUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts.extensions.get::<Identity>().cloned().ok_or_else(|| {
            warn!("identity missing from request extensions");
            AuthError::Unauthorized("Authentication required")
        })?;
        Ok(AuthUser(identity))
    }
}

/// `Json<T>` whose rejection renders as a `bad_request` error body.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            warn!(reason = %rejection.body_text(), "rejected request body");
            AuthError::from(rejection)
        })?;
        Ok(JsonBody(value))
    }
}
