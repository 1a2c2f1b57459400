use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::config::{create_cors_layer, create_security_headers_layer, Config};
use crate::handlers::{events, health_check};
use crate::state::AppState;

pub fn event_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/public", get(events::list_public_events))
        .route("/closeby", get(events::list_nearby_events))
        .route("/create", post(events::create_event))
        .route("/:id/members", get(events::list_members))
        .route("/:id/assets", get(events::list_assets))
        .route("/:id/join", post(events::join_event))
        .route(
            "/:id/upload",
            post(events::upload_asset).layer(DefaultBodyLimit::max(state.max_upload_bytes)),
        )
}

pub fn create_routes(state: AppState, config: &Config) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/events", event_routes(&state))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(create_security_headers_layer(config.production))
        .layer(create_cors_layer(&config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
