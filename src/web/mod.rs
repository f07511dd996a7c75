pub mod handlers;
pub mod responses;

use crate::config::Config;
use axum::{
    routing::{get, patch, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use handlers::{
    create_event_handler, delete_event_handler, delete_schedule_handler, health_handler,
    list_events_handler, patch_schedule_handler, update_event_handler, validate_schedule_handler,
};

#[derive(Clone)]
pub struct AppState {
    /// Read-only configuration shared by all requests
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/schedule",
            get(list_events_handler).post(validate_schedule_handler),
        )
        .route(
            "/schedule/{event_id}",
            patch(patch_schedule_handler).delete(delete_schedule_handler),
        )
        .route(
            "/calendar",
            get(list_events_handler).post(create_event_handler),
        )
        .route(
            "/calendar/{id}",
            put(update_event_handler).delete(delete_event_handler),
        )
}

/// Build the application router
///
/// Every route is served both at the root and under `/api`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes())
        .nest("/api", routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
