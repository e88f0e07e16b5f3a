//! Error types for `folio-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("an entry with slug {0:?} already exists")]
  SlugTaken(String),

  #[error("entry not found: {0}")]
  EntryNotFound(i64),

  #[error("invalid {field}: {message}")]
  Validation {
    field:   &'static str,
    message: String,
  },

  #[error("unknown entry kind: {0:?}")]
  UnknownKind(String),
}

impl Error {
  pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
    Self::Validation { field, message: message.into() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
