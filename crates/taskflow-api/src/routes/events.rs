//! Read-only routes over event history and causality.

use axum::extract::{Path, State};
use axum::{Json, Router, routing::get};
use serde::Serialize;
use taskflow_core::error::DomainError;
use taskflow_core::event::DomainEvent;
use taskflow_pipeline::CausalityStatistics;

use crate::error::ApiError;
use crate::state::AppState;

/// Every event of one logical operation.
#[derive(Debug, Serialize)]
pub struct CorrelationResponse {
    /// The correlation queried.
    pub correlation_id: String,
    /// Stored events in append order.
    pub events: Vec<DomainEvent>,
}

/// Lineage of one event.
#[derive(Debug, Serialize)]
pub struct ChainResponse {
    /// The event queried.
    pub event_id: String,
    /// The earliest known ancestor.
    pub root_cause: String,
    /// Root cause first, the queried event last.
    pub full_chain: Vec<String>,
    /// Known ancestors, most recent first.
    pub ancestors: Vec<String>,
    /// Known direct and indirect descendants.
    pub descendants: Vec<String>,
}

/// GET /correlation/{correlation_id}
async fn correlation(
    State(state): State<AppState>,
    Path(correlation_id): Path<String>,
) -> Result<Json<CorrelationResponse>, ApiError> {
    let events = state.store().get_events_by_causality(&correlation_id).await?;
    Ok(Json(CorrelationResponse {
        correlation_id,
        events,
    }))
}

/// GET /{event_id}/chain
async fn chain(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<ChainResponse>, ApiError> {
    let tracker = &state.causality;
    let Some(chain) = tracker.get_event_chain(&event_id) else {
        return Err(DomainError::EventNotFound(event_id).into());
    };
    Ok(Json(ChainResponse {
        root_cause: tracker.get_root_cause(&event_id),
        full_chain: tracker.get_full_chain(&event_id),
        ancestors: chain.ancestors,
        descendants: chain.descendants,
        event_id,
    }))
}

/// GET /stats
async fn stats(State(state): State<AppState>) -> Json<CausalityStatistics> {
    Json(state.causality.get_statistics())
}

/// Returns the router for event queries.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats))
        .route("/correlation/{correlation_id}", get(correlation))
        .route("/{event_id}/chain", get(chain))
}
