//! The evaluation engine: resolve the author of a comment, run the rule set
//! against their profile, and on a match ban the author and delete the
//! comment.
//!
//! Each call to [`Engine::evaluate_comment`] is an independent unit of work.
//! Its steps run strictly in sequence and none of them is retried. Any number
//! of evaluations may run concurrently; the user cache is the only state they
//! share.

use std::sync::Arc;

use crate::{
  Error, EvaluateError, Result,
  cache::{DEFAULT_CAPACITY, UserCache},
  comment::Comment,
  gateway::{BanRequest, Gateway, SUCCESS_STATUS},
  profile::{ProfileField, UserProfile},
  rules::{BanReason, RuleSet},
};

/// Optional fields requested for every author lookup.
const AUTHOR_FIELDS: &[ProfileField] = &[ProfileField::BirthDate];

/// Convert the owner id of a community wall into the group id expected by
/// the ban operation.
///
/// Community walls have negative owner ids while the ban API addresses the
/// group by its positive id, so the sign is flipped. Getting this wrong bans
/// the user from a different community, or fails outright. `i64::MIN` has
/// no positive counterpart and is rejected.
pub fn ban_group_id(owner_id: i64) -> Result<i64> {
  owner_id.checked_neg().ok_or(Error::InvalidOwner(owner_id))
}

/// Comment evaluator. Owns the rule set, the user cache and the gateway for
/// its whole lifetime.
pub struct Engine<G> {
  gateway: G,
  rules:   RuleSet,
  cache:   UserCache,
}

impl<G: Gateway> Engine<G> {
  pub fn new(gateway: G, rules: RuleSet) -> Self {
    Self::with_cache_capacity(gateway, rules, DEFAULT_CAPACITY)
  }

  pub fn with_cache_capacity(gateway: G, rules: RuleSet, capacity: usize) -> Self {
    Self {
      gateway,
      rules,
      cache: UserCache::new(capacity),
    }
  }

  pub fn gateway(&self) -> &G { &self.gateway }

  pub fn rules(&self) -> &RuleSet { &self.rules }

  pub fn cache(&self) -> &UserCache { &self.cache }

  /// Evaluate a single comment and enforce the outcome.
  ///
  /// Returns the reason the author was banned, or [`BanReason::None`] if no
  /// rule fired. If a rule fired but enforcement failed, the error carries
  /// the reason; see [`EvaluateError::reason`]. A successful ban is never
  /// rolled back when the subsequent delete fails.
  pub async fn evaluate_comment(
    &self,
    comment: &Comment,
  ) -> Result<BanReason, EvaluateError> {
    let author = match self.resolve_author(comment).await {
      Ok(author) => author,
      Err(Error::CommentFromCommunity) => {
        tracing::debug!(
          comment_id = comment.id,
          author_id = comment.author_id,
          "skipping comment from community"
        );
        return Ok(BanReason::None);
      }
      Err(e) => return Err(EvaluateError::ResolveUser(e)),
    };

    tracing::debug!(
      user_id = author.id,
      first_name = %author.first_name,
      last_name = %author.last_name,
      birth_date = %author.birth_date,
      "resolved comment author"
    );

    let Some(reason) = self.rules.evaluate(&author) else {
      return Ok(BanReason::None);
    };
    tracing::info!(
      comment_id = comment.id,
      user_id = author.id,
      %reason,
      "heuristic rule fired"
    );

    self
      .ban_author(comment, author.id, reason)
      .await
      .map_err(|source| EvaluateError::Ban { reason, source })?;
    self
      .delete_comment(comment)
      .await
      .map_err(|source| EvaluateError::Delete { reason, source })?;

    tracing::info!(
      comment_id = comment.id,
      user_id = author.id,
      %reason,
      "user banned and comment deleted"
    );
    Ok(reason)
  }

  /// Cache-or-fetch the author of `comment`.
  ///
  /// Resolution failures for community-attributable comments are reported as
  /// [`Error::CommentFromCommunity`].
  async fn resolve_author(&self, comment: &Comment) -> Result<Arc<UserProfile>> {
    let user_id = comment.author_id;
    if let Some(profile) = self.cache.get(user_id) {
      tracing::debug!(user_id, "user cache hit");
      return Ok(profile);
    }

    let fetched = self
      .gateway
      .fetch_users(user_id, AUTHOR_FIELDS)
      .await
      .map_err(|e| Error::Transport(Box::new(e)))
      .and_then(|users| users.into_iter().next().ok_or(Error::UserNotFound(user_id)));

    match fetched {
      Ok(profile) => {
        let profile = Arc::new(profile);
        self.cache.put(user_id, Arc::clone(&profile));
        Ok(profile)
      }
      Err(_) if comment.is_from_community() => Err(Error::CommentFromCommunity),
      Err(e) => Err(e),
    }
  }

  async fn ban_author(
    &self,
    comment: &Comment,
    user_id: i64,
    reason: BanReason,
  ) -> Result<()> {
    let request = BanRequest {
      group_id: ban_group_id(comment.owner_id)?,
      user_id,
      comment: reason.to_string(),
      comment_visible: false,
    };
    let status = self
      .gateway
      .ban_user(request)
      .await
      .map_err(|e| Error::Transport(Box::new(e)))?;
    expect_success("groups.ban", status)
  }

  async fn delete_comment(&self, comment: &Comment) -> Result<()> {
    let status = self
      .gateway
      .delete_comment(comment.owner_id, comment.id)
      .await
      .map_err(|e| Error::Transport(Box::new(e)))?;
    expect_success("wall.deleteComment", status)
  }
}

fn expect_success(operation: &'static str, status: i64) -> Result<()> {
  if status == SUCCESS_STATUS {
    Ok(())
  } else {
    Err(Error::BadResponse { operation, status })
  }
}
