use dotenvy::dotenv;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use eventhub_server::auth::SessionTokenProvider;
use eventhub_server::config::{Config, StorageKind};
use eventhub_server::routes::create_routes;
use eventhub_server::services::{EventService, EventSettings};
use eventhub_server::storage::{LocalFileUploader, StorageBackend};
use eventhub_server::AppState;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env();

    let backend = match config.storage {
        StorageKind::Postgres => StorageBackend::postgres(&config.database_url)
            .await
            .expect("Failed to initialise database"),
        StorageKind::Memory => {
            tracing::warn!("Using in-memory storage, data is lost on restart");
            StorageBackend::in_memory()
        }
    };

    match (&config.dev_session_token, config.storage) {
        (Some(token), StorageKind::Memory) => {
            if let Some(user) = backend.seed_dev_session(token) {
                tracing::warn!(user_id = %user.id, "Seeded developer session from DEV_SESSION_TOKEN");
            }
        }
        (Some(_), StorageKind::Postgres) => {
            tracing::warn!("DEV_SESSION_TOKEN ignored with postgres storage");
        }
        (None, StorageKind::Memory) => {
            tracing::warn!("No DEV_SESSION_TOKEN set, authenticated routes are unreachable");
        }
        (None, StorageKind::Postgres) => {}
    }

    let uploader = LocalFileUploader::new(&config.upload_dir);
    tracing::info!(upload_dir = %uploader.root().display(), "Asset uploads enabled");

    let state = AppState {
        events: EventService::new(
            backend.event_store(),
            Arc::new(uploader),
            EventSettings::from(&config),
        ),
        identity: Arc::new(SessionTokenProvider::new(backend.session_store())),
        max_upload_bytes: config.max_upload_bytes,
    };

    let app = create_routes(state, &config);

    tracing::info!("🚀 Server running at http://{}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
