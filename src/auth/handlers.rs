use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, MessageResponse, PublicUser, RegisterRequest},
        extractors::{AuthUser, JsonBody},
        password::MAX_PASSWORD_BYTES,
        guard::{authenticate_user, is_admin},
        services::{is_valid_email, normalize_email},
    },
    error::AuthError,
    state::AppState,
};

pub const ADMIN_WELCOME: &str = "Welcome Admin! You have access to this route.";

const MIN_PASSWORD_LEN: usize = 8;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
}

pub fn me_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/me", get(get_me))
        .route_layer(middleware::from_fn_with_state(state, authenticate_user))
}

/// Routes behind both guard steps. Layers run outermost-last, so
/// `authenticate_user` executes before `is_admin`.
pub fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin-only", get(admin_only))
        .route_layer(middleware::from_fn(is_admin))
        .route_layer(middleware::from_fn_with_state(state, authenticate_user))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AuthError> {
    let email = normalize_email(&payload.email);

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AuthError::Validation("Invalid email".into()));
    }

    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(AuthError::Validation("Password too short".into()));
    }

    if payload.password.len() > MAX_PASSWORD_BYTES {
        warn!("password too long");
        return Err(AuthError::Validation(format!(
            "Password must be at most {} bytes",
            MAX_PASSWORD_BYTES
        )));
    }

    let user = state.auth.create_user(&email, &payload.password).await?;

    let token = state.keys.sign(&user).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        AuthError::Internal(e.to_string())
    })?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let email = normalize_email(&payload.email);

    let user = state.auth.login(&email, &payload.password).await?;

    let token = state.keys.sign(&user).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        AuthError::Internal(e.to_string())
    })?;

    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

#[instrument(skip_all)]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<PublicUser>, AuthError> {
    let user = state
        .auth
        .store()
        .find_user_by_id(identity.user_id)
        .await?
        .ok_or_else(|| {
            warn!(user_id = identity.user_id, "token refers to a missing user");
            AuthError::Unauthorized("User not found")
        })?;

    Ok(Json(user.into()))
}

#[instrument(skip_all)]
pub async fn admin_only(AuthUser(identity): AuthUser) -> Json<MessageResponse> {
    info!(user_id = identity.user_id, "admin route served");
    Json(MessageResponse {
        message: ADMIN_WELCOME,
    })
}
