//! Taskflow API — HTTP surface over the domain event pipeline.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the full application router.
pub fn app(state: AppState) -> Router {
    routes()
        .layer(TraceLayer::new_for_http())
        // TODO: Replace CorsLayer::permissive() with restricted origins for production.
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// The route tree without middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/tasks", routes::tasks::router())
        .nest("/api/v1/qc", routes::qc::router())
        .nest("/api/v1/issues", routes::issues::router())
        .nest("/api/v1/events", routes::events::router())
}
