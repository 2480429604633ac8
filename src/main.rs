mod app;
mod auth;
mod bookings;
mod config;
mod db;
mod error;
mod guards;
mod state;
mod storage;
mod testimonials;
mod users;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "wanderly=debug,axum=info,tower_http=info".to_string());
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

    // a corrupt or unreachable store aborts here
    let app_state = AppState::init().await?;
    tracing::info!(
        medium = %app_state.store.medium().describe(),
        "store ready"
    );

    let host = app_state.config.host.clone();
    let port = app_state.config.port;
    let app = app::build_app(app_state);
    app::serve(app, &host, port).await
}
