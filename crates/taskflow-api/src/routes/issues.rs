//! Routes for the issue tracking context.

use axum::extract::{Path, State};
use axum::{
    Json, Router,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::{info, instrument};

use taskflow_issues::application::command_handlers;
use taskflow_issues::application::query_handlers::{self, IssueView};
use taskflow_issues::domain::commands;

use super::{CommandResponse, correlation_or_new};
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /{issue_id}/resolve.
#[derive(Debug, Deserialize)]
pub struct ResolveIssueRequest {
    /// How the issue was resolved.
    pub resolution: String,
    /// Existing operation to join; a new one is started if absent.
    #[serde(default)]
    pub correlation_id: Option<String>,
    /// Event that prompted the resolution.
    #[serde(default)]
    pub causation_id: Option<String>,
}

/// POST /{issue_id}/resolve
#[instrument(skip(state, request), fields(issue_id = %issue_id))]
async fn resolve_issue(
    State(state): State<AppState>,
    Path(issue_id): Path<String>,
    Json(request): Json<ResolveIssueRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::ResolveIssue {
        correlation_id: correlation_or_new(request.correlation_id),
        causation_id: request.causation_id,
        issue_id,
        resolution: request.resolution,
    };

    info!(correlation_id = %command.correlation_id, "handling resolve_issue command");

    let result =
        command_handlers::handle_resolve_issue(&command, state.clock.as_ref(), &state.publisher)
            .await?;

    Ok(Json(CommandResponse::new(
        result.aggregate_id,
        &result.events,
        command.correlation_id,
    )))
}

/// GET /
async fn open_issues(State(state): State<AppState>) -> Json<Vec<IssueView>> {
    Json(state.issues.open_issues())
}

/// GET /{issue_id}
async fn get_issue(
    State(state): State<AppState>,
    Path(issue_id): Path<String>,
) -> Result<Json<IssueView>, ApiError> {
    let view = query_handlers::get_issue_by_id(&issue_id, state.store()).await?;
    Ok(Json(view))
}

/// Returns the router for the issue context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(open_issues))
        .route("/{issue_id}", get(get_issue))
        .route("/{issue_id}/resolve", post(resolve_issue))
}
