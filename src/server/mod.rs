pub mod handlers;
pub mod types;

use crate::{
    Result,
    config::{Config, ServerConfig},
    vision,
};
use axum::{Router, extract::DefaultBodyLimit, routing::post};
use handlers::AppState;
use std::net::SocketAddr;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

/// API routes plus static assets from `public_dir` for everything else.
pub fn router(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/analyze", post(handlers::analyze))
        .route("/download", post(handlers::download))
        .fallback_service(ServeDir::new(&server.public_dir))
        .layer(DefaultBodyLimit::max(server.body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: Config) -> Result<()> {
    let vision = vision::create_client(&config.llm)?;
    info!(
        "Using {:?} vision provider with model {}",
        config.llm.provider,
        config.llm.effective_model()
    );

    let app_state = AppState::new(&config, vision);
    let app = router(app_state, &config.server);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
