use axum::http::{HeaderValue, Method};
use log::*;
use tower_http::cors::CorsLayer;

pub(crate) mod controller;
pub(crate) mod cookies;
pub(crate) mod error;
pub(crate) mod extractors;
pub(crate) mod router;

pub use error::{Error, Result};
pub use service::AppState;

/// Binds the listener and serves the API router until shutdown.
pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let host = app_state
        .config
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let port = app_state.config.port;
    let listen_address = format!("{host}:{port}");

    let allowed_origins: Vec<HeaderValue> = app_state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    // Session cookies ride on credentials'd requests from the frontend origin.
    let cors_layer = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_credentials(true)
        .allow_origin(allowed_origins);

    info!("Server starting... listening for connections on http://{listen_address}");

    let listener = tokio::net::TcpListener::bind(&listen_address).await?;
    axum::serve(
        listener,
        router::define_routes(app_state).layer(cors_layer),
    )
    .await
}
