//! DCEvent API server entry point.

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use dcevent_api::config::Config;
use dcevent_api::error::AppError;
use dcevent_api::routes;
use dcevent_api::state::AppState;
use dcevent_transport::http_fetcher::HttpFetcher;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting DCEvent API server");

    // Read configuration from environment.
    let config = Config::from_env()?;
    tracing::info!(upstream = %config.api_base_url, lang = ?config.lang, "upstream API configured");

    let fetcher = HttpFetcher::new(config.http_timeout).map_err(AppError::from)?;
    let app_state = AppState::new(config.endpoints()?, Arc::new(fetcher));

    // Embedded on third-party event sites; any origin may call.
    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/events", routes::events::router())
        .nest("/api/v1/widget", routes::widget::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server.
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| format!("invalid HOST:PORT combination: {e}"))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
