//! Error types shared across the backend.
//!
//! `ValidationError` is the only failure the quiz core reports. Everything
//! else comes from collaborators (content generators, the remote API) and is
//! folded into `AppError` for the HTTP/WebSocket surface.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use thiserror::Error;

use crate::api::ApiError;
use crate::generator::GenerationError;
use crate::task::TaskError;

/// Rejected user input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
  #[error("Please provide study material (at least {min} characters)")]
  SourceTooShort { min: usize },
  #[error("Number of questions must be one of 3, 5, 10 or 15 (got {0})")]
  QuestionCount(usize),
  #[error("Generated quiz is malformed: {0}")]
  MalformedQuiz(String),
  #[error("Title is required")]
  TitleRequired,
  #[error("Title must be at most {max} characters")]
  TitleTooLong { max: usize },
  #[error("Text must be at least {min} characters long")]
  TextTooShort { min: usize },
  #[error("Text must be at most {max} characters")]
  TextTooLong { max: usize },
  #[error("Unknown summary type '{0}'")]
  SummaryType(String),
  #[error("Message must not be empty")]
  EmptyMessage,
  #[error("Please provide some text to summarize")]
  EmptyText,
  #[error("Option {index} is out of range (question has {len} options)")]
  OptionOutOfRange { index: usize, len: usize },
}

/// Error surfaced to HTTP and WebSocket clients.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
  #[error(transparent)]
  Validation(#[from] ValidationError),
  #[error("Please sign in to continue")]
  Unauthorized,
  #[error("{0} not found")]
  NotFound(String),
  #[error("{0}")]
  Conflict(String),
  #[error(transparent)]
  Task(#[from] TaskError),
  #[error(transparent)]
  Api(#[from] ApiError),
}

impl From<GenerationError> for AppError {
  fn from(e: GenerationError) -> Self {
    AppError::Task(TaskError::Failed(e))
  }
}

impl AppError {
  pub fn status(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Unauthorized => StatusCode::UNAUTHORIZED,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::Task(TaskError::Cancelled | TaskError::AlreadyRunning(_)) => StatusCode::CONFLICT,
      AppError::Task(TaskError::TimedOut(_)) => StatusCode::GATEWAY_TIMEOUT,
      AppError::Task(_) => StatusCode::BAD_GATEWAY,
      AppError::Api(ApiError::Unauthorized(_)) => StatusCode::UNAUTHORIZED,
      AppError::Api(ApiError::NotFound(_)) => StatusCode::NOT_FOUND,
      AppError::Api(_) => StatusCode::BAD_GATEWAY,
    }
  }

  /// Message shown to the user. Collaborator failures are not distinguished
  /// by cause beyond what the remote API reported.
  pub fn user_message(&self) -> String {
    match self {
      AppError::Task(TaskError::Failed(_)) | AppError::Task(TaskError::Panicked) => {
        "Failed to generate content. Please try again.".into()
      }
      other => other.to_string(),
    }
  }
}

#[derive(serde::Serialize)]
struct ErrorBody {
  success: bool,
  message: String,
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(target: "study_companion", error = %self, %status, "Request failed");
    } else {
      tracing::debug!(target: "study_companion", error = %self, %status, "Request rejected");
    }
    (status, Json(ErrorBody { success: false, message: self.user_message() })).into_response()
  }
}
