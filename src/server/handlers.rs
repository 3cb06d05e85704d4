use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, FormRejection},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokenrelay_flow::{Credentials, LoginRequest};
use tokenrelay_registry::TaskId;
use tracing::{debug, info, warn};

use super::error::{ErrorShape, HttpError};
use super::state::AppState;
use super::wire::{
    CreateTaskRequest, TaskResponse, TaskStatusRequest, TaskStatusResponse, TokenForm,
};
use crate::metrics;

pub const ENDPOINTS_TEXT: &str = "Available endpoints: /token, /createTask, /getTaskResult";

pub async fn index() -> &'static str {
    ENDPOINTS_TEXT
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "tracked_tasks": state.orchestrator.tracked(),
    }))
}

pub async fn metrics_handler() -> Response {
    metrics::render()
}

fn parse_body<T: DeserializeOwned>(
    body: Result<Bytes, BytesRejection>,
    shape: ErrorShape,
) -> Result<T, HttpError> {
    let body = body.map_err(|err| {
        debug!(%err, "failed to read request body");
        HttpError::unreadable_body(shape)
    })?;
    serde_json::from_slice(&body).map_err(|err| {
        debug!(%err, "rejecting malformed json body");
        HttpError::invalid_json(shape)
    })
}

pub async fn create_task(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<TaskResponse>, HttpError> {
    let request: CreateTaskRequest = parse_body(body, ErrorShape::Task)?;
    if !state.access_key_matches(&request.access_key) {
        warn!("createTask rejected: invalid access key");
        return Err(HttpError::unauthorized(ErrorShape::Task));
    }
    if request.mail.trim().is_empty() || request.url.trim().is_empty() {
        return Err(HttpError::invalid_argument(
            ErrorShape::Task,
            "mail and url are required",
        ));
    }

    let id = state.orchestrator.submit(request.into_login_request());
    info!(task_id = %id, "task accepted");
    Ok(Json(TaskResponse::accepted(id.as_str())))
}

pub async fn get_task_result(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<TaskStatusResponse>, HttpError> {
    let request: TaskStatusRequest = parse_body(body, ErrorShape::Status)?;
    if !state.access_key_matches(&request.access_key) {
        warn!("getTaskResult rejected: invalid access key");
        return Err(HttpError::unauthorized(ErrorShape::Status));
    }

    let record = state
        .orchestrator
        .registry()
        .get(&TaskId::new(request.id.as_str()));
    Ok(Json(TaskStatusResponse::from_record(request.id, record)))
}

/// Runs the login inline and answers with the raw token.
pub async fn legacy_token(
    State(state): State<AppState>,
    form: Result<Form<TokenForm>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(err) => return (StatusCode::BAD_REQUEST, err.body_text()).into_response(),
    };
    let request = LoginRequest::new(Credentials::new(form.email, form.password), form.url);
    match state.orchestrator.run_now(request).await {
        Ok(token) => token.into_response(),
        Err(err) => {
            let status = if err.is_timeout() {
                StatusCode::GATEWAY_TIMEOUT
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, err.to_string()).into_response()
        }
    }
}
