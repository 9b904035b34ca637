use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use ::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::application::error::TodoError;

pub const INTERNAL_ERROR_MESSAGE: &str = "Error Occured in Server";

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "errorMessage")]
    pub error_message: String,
}

/// Terminal failure path for every handler.
#[derive(Debug)]
pub struct ApiError(pub TodoError);

impl From<TodoError> for ApiError {
    fn from(err: TodoError) -> Self { Self(err) }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self { Self(TodoError::Validation(rejection.body_text())) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            TodoError::Validation(message) => {
                tracing::warn!(%message, "validation failed");
                (StatusCode::BAD_REQUEST, message.clone())
            }
            TodoError::NotFound => {
                tracing::warn!("todo not found");
                (StatusCode::NOT_FOUND, self.0.to_string())
            }
            TodoError::Internal(err) => {
                tracing::error!(error = ?err, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE.to_owned())
            }
        };
        (status, axum::Json(ErrorBody { error_message: message })).into_response()
    }
}
