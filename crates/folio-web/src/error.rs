//! Error types and axum `IntoResponse` implementation.

use axum::{
  http::StatusCode,
  response::{Html, IntoResponse, Response},
};
use folio_core::store::StoreError;
use thiserror::Error;

use crate::{uploads::UploadError, views};

#[derive(Debug, Error)]
pub enum Error {
  #[error("not found")]
  NotFound,
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
  #[error("internal error: {0}")]
  Internal(String),
}

impl Error {
  /// Classify a backend error: a missing entry is a 404, anything else is a
  /// storage fault.
  pub fn store<E: StoreError>(e: E) -> Self {
    match e.as_core() {
      Some(folio_core::Error::EntryNotFound(_)) => Error::NotFound,
      _ => Error::Store(Box::new(e)),
    }
  }
}

impl From<UploadError> for Error {
  fn from(e: UploadError) -> Self {
    match e {
      UploadError::Io(e) => Error::Io(e),
      rejected => Error::BadRequest(rejected.to_string()),
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::NotFound => (StatusCode::NOT_FOUND, Html(views::not_found())).into_response(),
      Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
      Error::Store(_) | Error::Io(_) | Error::Internal(_) => {
        tracing::error!(error = %self, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, Html(views::server_error())).into_response()
      }
    }
  }
}
