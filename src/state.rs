use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::auth::{jwt::JwtKeys, repo::PgCredentialStore, services::AuthService};
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub keys: JwtKeys,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Connects the pool described by `config`. Callers own the pool; the
    /// auth service only ever sees it through its `CredentialStore`.
    pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
        PgPoolOptions::new()
            .max_connections(config.db.max_connections)
            .acquire_timeout(config.db.acquire_timeout())
            .connect(&config.db.url)
            .await
            .context("connect to database")
    }

    pub fn from_parts(db: PgPool, config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let store = Arc::new(PgCredentialStore::new(db));
        let auth = Arc::new(AuthService::new(store, config.bcrypt_cost)?);
        let keys = JwtKeys::from_config(&config.jwt);
        Ok(Self { auth, keys, config })
    }
}

#[cfg(test)]
impl AppState {
    /// State backed by the in-memory store.
    pub fn fake() -> Self {
        use crate::auth::repo::memory::MemoryCredentialStore;

        let config = Arc::new(AppConfig::for_tests());
        let store = Arc::new(MemoryCredentialStore::default());
        let auth = Arc::new(
            AuthService::new(store, config.bcrypt_cost).expect("auth service"),
        );
        let keys = JwtKeys::from_config(&config.jwt);
        Self { auth, keys, config }
    }
}
