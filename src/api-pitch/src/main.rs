use core_pitch::{AppConfig, bind_address, setup_logging};

use api_pitch::{AppState, routes};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    setup_logging("api_pitch=debug,core_pitch=info,tower_http=debug");

    let config = AppConfig::from_env();
    let state = AppState::from_config(&config);
    match state.clients.load().await {
        Ok(count) => tracing::info!("{} clients available", count),
        Err(e) => tracing::error!("Could not load {}: {}", config.snapshot_path().display(), e),
    }

    let app = routes::router(&config.public_dir).with_state(state);

    let addr = bind_address().unwrap_or_else(|e| panic!("{}", e));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to address {}: {}", addr, e));
    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, app).await.expect("Server error");
}
