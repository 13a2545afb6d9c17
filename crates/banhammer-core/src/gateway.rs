//! The `Gateway` trait: the narrow capability the engine needs from the
//! social network.
//!
//! Implemented by `banhammer-vk` against the real API and by test doubles.
//! The engine depends on this abstraction, never on a concrete client.

use std::future::Future;

use crate::profile::{ProfileField, UserProfile};

/// Status code the remote API reports for a successful write.
pub const SUCCESS_STATUS: i64 = 1;

/// Parameters of a group ban.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanRequest {
  /// Group id in the sign convention the remote API expects.
  pub group_id:        i64,
  pub user_id:         i64,
  /// Note attached to the ban, shown to moderators.
  pub comment:         String,
  /// Whether the note is shown to the banned user.
  pub comment_visible: bool,
}

/// Remote social-network operations.
///
/// All methods return `Send` futures so an engine holding a gateway can be
/// driven from axum handlers on a multi-threaded runtime.
pub trait Gateway: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch a user with the requested optional `fields`. An empty vector
  /// means the user does not exist.
  fn fetch_users<'a>(
    &'a self,
    user_id: i64,
    fields: &'a [ProfileField],
  ) -> impl Future<Output = Result<Vec<UserProfile>, Self::Error>> + Send + 'a;

  /// Ban a user in a group. Returns the status code reported by the API.
  fn ban_user(
    &self,
    request: BanRequest,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  /// Delete a wall comment. Returns the status code reported by the API.
  fn delete_comment(
    &self,
    owner_id: i64,
    comment_id: i64,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;
}
