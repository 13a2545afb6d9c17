//! Wall comments as delivered by the callback API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Text prefix of a reply addressed on behalf of a community, e.g.
/// `[club61061413|Group name], thanks!`.
pub const COMMUNITY_REPLY_MARKER: &str = "[club";

/// A new wall comment. Immutable once received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  pub id:        i64,
  /// Author of the comment. Negative for communities and pages.
  #[serde(rename = "from_id")]
  pub author_id: i64,
  #[serde(default)]
  pub post_id:   i64,
  /// Owner of the wall. Negative when the wall belongs to a community.
  pub owner_id:  i64,
  /// Unix timestamp, seconds.
  #[serde(default)]
  pub date:      i64,
  #[serde(default)]
  pub text:      String,
}

impl Comment {
  /// Whether the comment is attributable to a community or page rather than
  /// a person.
  pub fn is_from_community(&self) -> bool {
    self.author_id < 0 || self.text.starts_with(COMMUNITY_REPLY_MARKER)
  }

  pub fn posted_at(&self) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(self.date, 0)
  }
}
