use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::wire::{TaskResponse, TaskStatusResponse};

/// Body layout an error is rendered in; each endpoint answers in its own shape.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorShape {
    Task,
    Status,
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    shape: ErrorShape,
    message: String,
}

impl HttpError {
    fn new(status: StatusCode, shape: ErrorShape, message: impl Into<String>) -> Self {
        Self {
            status,
            shape,
            message: message.into(),
        }
    }

    pub fn unreadable_body(shape: ErrorShape) -> Self {
        Self::new(StatusCode::BAD_REQUEST, shape, "Failed to read request body")
    }

    pub fn invalid_json(shape: ErrorShape) -> Self {
        Self::new(StatusCode::BAD_REQUEST, shape, "Invalid JSON format")
    }

    pub fn invalid_argument(shape: ErrorShape, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, shape, message)
    }

    pub fn unauthorized(shape: ErrorShape) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, shape, "Invalid access key")
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        match self.shape {
            ErrorShape::Task => {
                (self.status, Json(TaskResponse::failure(self.message))).into_response()
            }
            ErrorShape::Status => {
                (self.status, Json(TaskStatusResponse::failure(self.message))).into_response()
            }
        }
    }
}
