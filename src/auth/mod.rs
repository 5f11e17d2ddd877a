use crate::state::AppState;
use axum::Router;

pub(crate) mod claims;
mod dto;
pub(crate) mod extractors;
pub mod guard;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
pub(crate) mod repo_types;
pub mod services;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::me_routes(state.clone()))
        .merge(handlers::admin_routes(state))
}
