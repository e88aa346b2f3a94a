//! Routes for the quality control context.

use axum::extract::{Path, State};
use axum::{
    Json, Router,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::{info, instrument};

use taskflow_qc::application::command_handlers;
use taskflow_qc::application::queue::PendingReview;
use taskflow_qc::domain::commands;

use super::{CommandResponse, correlation_or_new};
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /{task_id}/result.
#[derive(Debug, Deserialize)]
pub struct RecordQcResultRequest {
    /// Whether the task passed review.
    pub passed: bool,
    /// Reviewer notes.
    #[serde(default)]
    pub notes: String,
    /// Existing operation to join; a new one is started if absent.
    #[serde(default)]
    pub correlation_id: Option<String>,
    /// Submission being reviewed; defaults to the latest one.
    #[serde(default)]
    pub causation_id: Option<String>,
}

/// POST /{task_id}/result
#[instrument(skip(state, request), fields(task_id = %task_id, passed = request.passed))]
async fn record_result(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(request): Json<RecordQcResultRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::RecordQcResult {
        correlation_id: correlation_or_new(request.correlation_id),
        causation_id: request.causation_id,
        task_id,
        passed: request.passed,
        notes: request.notes,
    };

    info!(correlation_id = %command.correlation_id, "handling record_qc_result command");

    let result = command_handlers::handle_record_qc_result(
        &command,
        state.clock.as_ref(),
        &state.publisher,
    )
    .await?;

    Ok(Json(CommandResponse::new(
        result.aggregate_id,
        &result.events,
        command.correlation_id,
    )))
}

/// GET /pending
async fn pending(State(state): State<AppState>) -> Json<Vec<PendingReview>> {
    Json(state.qc_queue.pending())
}

/// Returns the router for the QC context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pending", get(pending))
        .route("/{task_id}/result", post(record_result))
}
