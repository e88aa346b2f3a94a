//! Routes for the task lifecycle context.

use axum::extract::{Path, State};
use axum::{
    Json, Router,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::{info, instrument};

use taskflow_tasks::application::command_handlers;
use taskflow_tasks::application::query_handlers::{self, TaskView};
use taskflow_tasks::domain::commands;

use super::{CommandResponse, correlation_or_new};
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    /// Short human-readable title.
    pub title: String,
    /// Existing operation to join; a new one is started if absent.
    #[serde(default)]
    pub correlation_id: Option<String>,
}

/// Request body for POST /{task_id}/submit.
#[derive(Debug, Deserialize)]
pub struct SubmitTaskRequest {
    /// Existing operation to join; a new one is started if absent.
    #[serde(default)]
    pub correlation_id: Option<String>,
    /// Event that prompted the submission.
    #[serde(default)]
    pub causation_id: Option<String>,
}

/// POST /
#[instrument(skip(state, request))]
async fn create_task(
    State(state): State<AppState>,
    Json(request): Json<CreateTaskRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::CreateTask {
        correlation_id: correlation_or_new(request.correlation_id),
        workspace_id: state.workspace_id.clone(),
        title: request.title,
    };

    info!(correlation_id = %command.correlation_id, "handling create_task command");

    let result =
        command_handlers::handle_create_task(&command, state.clock.as_ref(), &state.publisher)
            .await?;

    Ok(Json(CommandResponse::new(
        result.aggregate_id,
        &result.events,
        command.correlation_id,
    )))
}

/// POST /{task_id}/submit
#[instrument(skip(state, request), fields(task_id = %task_id))]
async fn submit_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(request): Json<SubmitTaskRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::SubmitTaskForQc {
        correlation_id: correlation_or_new(request.correlation_id),
        causation_id: request.causation_id,
        task_id,
    };

    info!(correlation_id = %command.correlation_id, "handling submit_task_for_qc command");

    let result = command_handlers::handle_submit_task_for_qc(
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

/// GET /{task_id}
async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskView>, ApiError> {
    let view = query_handlers::get_task_by_id(&task_id, state.store()).await?;
    Ok(Json(view))
}

/// GET /
async fn list_tasks(State(state): State<AppState>) -> Json<Vec<TaskView>> {
    Json(state.task_board.list())
}

/// Returns the router for the task context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_task).get(list_tasks))
        .route("/{task_id}", get(get_task))
        .route("/{task_id}/submit", post(submit_task))
}
