//! Error types for `cerrado-core`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The identification fragment is present but a required field is
  /// missing or blank.
  #[error("malformed entity: {0}")]
  MalformedEntity(&'static str),

  #[error("cannot read directory {path:?}: {source}")]
  Directory {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
