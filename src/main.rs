use std::sync::Arc;

mod app;
mod auth;
mod config;
mod error;
mod state;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "authgate=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = Arc::new(AppConfig::from_env()?);
    let db = AppState::connect(&config).await?;

    sqlx::migrate!("./migrations").run(&db).await?;

    let app_state = AppState::from_parts(db, config.clone())?;

    if let Some(admin) = &config.bootstrap_admin {
        app_state
            .auth
            .ensure_admin(&admin.email, &admin.password)
            .await?;
    }

    let app = app::build_app(app_state);
    app::serve(app, &config.listen_addr()).await
}
