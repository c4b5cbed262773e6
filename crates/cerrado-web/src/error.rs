//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::ibge::IbgeError;

#[derive(Debug, Error)]
pub enum Error {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The geographic registry answered with an error or could not be reached.
  #[error("{0}")]
  Upstream(String),

  #[error("{0}")]
  Internal(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Error::Store(Box::new(e))
  }
}

impl From<IbgeError> for Error {
  fn from(e: IbgeError) -> Self {
    match e {
      IbgeError::Status(_) | IbgeError::Connection(_) => Error::Upstream(e.to_string()),
      IbgeError::Unexpected(_) => Error::Internal(e.to_string()),
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = match &self {
      Error::NotFound(_) => StatusCode::NOT_FOUND,
      Error::BadRequest(_) => StatusCode::BAD_REQUEST,
      Error::Upstream(_) => StatusCode::BAD_GATEWAY,
      Error::Internal(_) | Error::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
      tracing::warn!(%status, error = %self, "request failed");
    }
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
