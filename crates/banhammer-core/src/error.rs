//! Error types for `banhammer-core`.

use thiserror::Error;

use crate::rules::BanReason;

#[derive(Debug, Error)]
pub enum Error {
  #[error("user {0} not found")]
  UserNotFound(i64),

  /// The remote call failed at the network or protocol level.
  #[error("transport error: {0}")]
  Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// The remote call went through but reported a non-success status.
  #[error("bad response from {operation}: status {status}")]
  BadResponse {
    operation: &'static str,
    status:    i64,
  },

  /// The comment was written on behalf of a community or page. Not a
  /// failure; the engine turns it into a clean no-match.
  #[error("comment is from a community")]
  CommentFromCommunity,

  /// The wall owner id has no group id counterpart.
  #[error("owner id {0} does not identify a community wall")]
  InvalidOwner(i64),

  #[error("invalid rule #{index}: {message}")]
  InvalidRule { index: usize, message: String },

  #[error("heuristic rules must contain at least one rule")]
  NoRules,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure of a single comment evaluation.
///
/// Enforcement failures carry the reason that was already decided, so a
/// caller can tell "a rule fired but enforcement failed" apart from "no rule
/// fired".
#[derive(Debug, Error)]
pub enum EvaluateError {
  #[error("failed to get user: {0}")]
  ResolveUser(#[source] Error),

  #[error("failed to ban user: {source}")]
  Ban {
    reason: BanReason,
    #[source]
    source: Error,
  },

  #[error("failed to delete comment: {source}")]
  Delete {
    reason: BanReason,
    #[source]
    source: Error,
  },
}

impl EvaluateError {
  /// The reason determined before the failure, or [`BanReason::None`] if the
  /// author could not be resolved.
  pub fn reason(&self) -> BanReason {
    match self {
      Self::ResolveUser(_) => BanReason::None,
      Self::Ban { reason, .. } | Self::Delete { reason, .. } => *reason,
    }
  }
}
