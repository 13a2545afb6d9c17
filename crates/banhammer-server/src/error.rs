//! Error types and axum `IntoResponse` implementation.

use std::path::PathBuf;

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("forbidden")]
  Forbidden,
  #[error("invalid configuration: {0}")]
  InvalidConfig(String),
  #[error("failed to read heuristics file {path:?}: {source}")]
  ReadHeuristics {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("failed to decode heuristics rules: {0}")]
  DecodeHeuristics(#[from] toml::de::Error),
  #[error("failed to validate heuristics rules: {0}")]
  InvalidHeuristics(#[from] banhammer_core::Error),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Forbidden => (StatusCode::FORBIDDEN, "Forbidden").into_response(),
      e => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
  }
}
