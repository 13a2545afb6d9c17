//! Callback API request payloads.

use serde::Deserialize;

/// Event type sent once when the callback address is registered.
pub const CONFIRMATION: &str = "confirmation";
/// Event type of a new wall comment.
pub const WALL_REPLY_NEW: &str = "wall_reply_new";

/// Envelope of every callback event.
#[derive(Debug, Deserialize)]
pub struct CallbackRequest {
  #[serde(rename = "type")]
  pub kind:     String,
  #[serde(default)]
  pub group_id: i64,
  #[serde(default)]
  pub event_id: Option<String>,
  /// Shared secret, present when configured in the community settings.
  #[serde(default)]
  pub secret:   Option<String>,
  /// Event payload; its shape depends on `kind`.
  #[serde(default)]
  pub object:   serde_json::Value,
}
