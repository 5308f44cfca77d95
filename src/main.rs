use log::*;
use service::{config::Config, logging::Logger, AppState};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::new();

    Logger::init_logger(&config);

    info!(
        "Starting session credential server in {} mode",
        config.runtime_env()
    );

    let database_connection = Arc::new(
        service::init_database(&config)
            .await
            .expect("Failed to connect to the database"),
    );

    let app_state = AppState::new(config, &database_connection);

    if let Err(error) = web::init_server(app_state).await {
        error!("Server exited with error: {error}");
    }
}
