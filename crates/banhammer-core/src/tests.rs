//! Engine scenarios against a scripted in-memory gateway.

use std::sync::{Arc, Mutex};

use crate::{
  Error, EvaluateError,
  comment::Comment,
  engine::{Engine, ban_group_id},
  gateway::{BanRequest, Gateway},
  profile::{ProfileField, UserProfile},
  rules::{BanReason, PersonNonGrataRule, RuleSet},
};

// ─── Test double ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
  FetchUsers { user_id: i64, fields: Vec<&'static str> },
  Ban(BanRequest),
  Delete { owner_id: i64, comment_id: i64 },
}

#[derive(Debug, Clone, Copy)]
enum Reply {
  Status(i64),
  Fail,
}

#[derive(Debug, thiserror::Error)]
#[error("fake gateway failure: {0}")]
struct FakeError(&'static str);

struct FakeGateway {
  users:       Vec<UserProfile>,
  fetch_fails: bool,
  ban:         Reply,
  delete:      Reply,
  calls:       Mutex<Vec<Call>>,
}

impl FakeGateway {
  fn with_users(users: Vec<UserProfile>) -> Self {
    Self {
      users,
      fetch_fails: false,
      ban: Reply::Status(1),
      delete: Reply::Status(1),
      calls: Mutex::new(Vec::new()),
    }
  }

  fn failing_fetch() -> Self {
    Self { fetch_fails: true, ..Self::with_users(Vec::new()) }
  }

  fn calls(&self) -> Vec<Call> { self.calls.lock().unwrap().clone() }

  fn fetch_count(&self) -> usize {
    self
      .calls()
      .iter()
      .filter(|c| matches!(c, Call::FetchUsers { .. }))
      .count()
  }

  fn record(&self, call: Call) { self.calls.lock().unwrap().push(call); }
}

fn reply(r: Reply, op: &'static str) -> Result<i64, FakeError> {
  match r {
    Reply::Status(s) => Ok(s),
    Reply::Fail => Err(FakeError(op)),
  }
}

impl Gateway for FakeGateway {
  type Error = FakeError;

  async fn fetch_users<'a>(
    &'a self,
    user_id: i64,
    fields: &'a [ProfileField],
  ) -> Result<Vec<UserProfile>, FakeError> {
    self.record(Call::FetchUsers {
      user_id,
      fields: fields.iter().map(|f| f.as_str()).collect(),
    });
    if self.fetch_fails {
      return Err(FakeError("users.get"));
    }
    Ok(self.users.iter().filter(|u| u.id == user_id).cloned().collect())
  }

  async fn ban_user(&self, request: BanRequest) -> Result<i64, FakeError> {
    self.record(Call::Ban(request));
    reply(self.ban, "groups.ban")
  }

  async fn delete_comment(&self, owner_id: i64, comment_id: i64) -> Result<i64, FakeError> {
    self.record(Call::Delete { owner_id, comment_id });
    reply(self.delete, "wall.deleteComment")
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

const AUTHOR: i64 = 87524863;
const OWNER: i64 = -61061413;

fn comment() -> Comment {
  Comment {
    id:        1,
    author_id: AUTHOR,
    post_id:   911,
    owner_id:  OWNER,
    date:      1580000000,
    text:      "test".into(),
  }
}

fn bob(birth_date: &str) -> UserProfile {
  UserProfile {
    id:         AUTHOR,
    first_name: "Bob".into(),
    last_name:  "Marley".into(),
    birth_date: birth_date.into(),
  }
}

fn rules(rules: &[(Option<&str>, Option<&str>)]) -> RuleSet {
  RuleSet {
    person_non_grata: rules
      .iter()
      .map(|(name, birth_date)| PersonNonGrataRule {
        name:       name.map(str::to_string),
        birth_date: birth_date.map(str::to_string),
      })
      .collect(),
  }
}

fn expected_ban() -> Call {
  Call::Ban(BanRequest {
    group_id:        61061413,
    user_id:         AUTHOR,
    comment:         "person_non_grata".into(),
    comment_visible: false,
  })
}

fn expected_delete() -> Call {
  Call::Delete { owner_id: OWNER, comment_id: 1 }
}

fn expected_fetch() -> Call {
  Call::FetchUsers { user_id: AUTHOR, fields: vec!["bdate"] }
}

// ─── Resolution ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn fetch_error_propagates() {
  let engine = Engine::new(FakeGateway::failing_fetch(), rules(&[(Some("Bob Marley"), None)]));
  let err = engine.evaluate_comment(&comment()).await.unwrap_err();
  assert!(matches!(err, EvaluateError::ResolveUser(Error::Transport(_))), "{err}");
  assert_eq!(err.reason(), BanReason::None);
  assert!(err.to_string().starts_with("failed to get user"));
}

#[tokio::test]
async fn missing_user_propagates() {
  let engine = Engine::new(FakeGateway::with_users(vec![]), rules(&[(Some("Bob Marley"), None)]));
  let err = engine.evaluate_comment(&comment()).await.unwrap_err();
  assert!(matches!(err, EvaluateError::ResolveUser(Error::UserNotFound(AUTHOR))), "{err}");
  assert!(engine.cache().is_empty());
}

#[tokio::test]
async fn community_author_failure_is_swallowed() {
  let engine = Engine::new(FakeGateway::failing_fetch(), rules(&[(Some("Bob Marley"), None)]));
  let from_group = Comment { author_id: OWNER, ..comment() };
  assert_eq!(engine.evaluate_comment(&from_group).await.unwrap(), BanReason::None);
}

#[tokio::test]
async fn community_reply_marker_failure_is_swallowed() {
  let engine = Engine::new(FakeGateway::with_users(vec![]), rules(&[(Some("Bob Marley"), None)]));
  let reply = Comment { text: "[club61061413|Reggae], thanks".into(), ..comment() };
  assert_eq!(engine.evaluate_comment(&reply).await.unwrap(), BanReason::None);
  assert_eq!(engine.gateway().calls(), vec![expected_fetch()]);
}

#[tokio::test]
async fn resolvable_community_reply_is_still_evaluated() {
  let engine = Engine::new(
    FakeGateway::with_users(vec![bob("")]),
    rules(&[(Some("Bob Marley"), None)]),
  );
  let reply = Comment { text: "[club61061413|Reggae], thanks".into(), ..comment() };
  assert_eq!(engine.evaluate_comment(&reply).await.unwrap(), BanReason::PersonNonGrata);
}

// ─── Evaluation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn no_match_has_no_side_effects() {
  let engine = Engine::new(FakeGateway::with_users(vec![bob("")]), rules(&[(Some("test"), None)]));
  assert_eq!(engine.evaluate_comment(&comment()).await.unwrap(), BanReason::None);
  assert_eq!(engine.gateway().calls(), vec![expected_fetch()]);
}

#[tokio::test]
async fn banned_by_name() {
  let engine = Engine::new(
    FakeGateway::with_users(vec![bob("")]),
    rules(&[(Some("Bob Marley"), None)]),
  );
  assert_eq!(engine.evaluate_comment(&comment()).await.unwrap(), BanReason::PersonNonGrata);
  assert_eq!(
    engine.gateway().calls(),
    vec![expected_fetch(), expected_ban(), expected_delete()]
  );
}

#[tokio::test]
async fn banned_by_name_and_birth_date() {
  let engine = Engine::new(
    FakeGateway::with_users(vec![bob("1.1.2000")]),
    rules(&[(Some("Bob Marley"), Some("1.1.2000"))]),
  );
  assert_eq!(engine.evaluate_comment(&comment()).await.unwrap(), BanReason::PersonNonGrata);
  assert_eq!(engine.gateway().calls().len(), 3);
}

#[tokio::test]
async fn partial_overlap_does_not_ban() {
  let engine = Engine::new(
    FakeGateway::with_users(vec![bob("2.2.2002")]),
    rules(&[(Some("Bob Marley"), Some("1.1.2000"))]),
  );
  assert_eq!(engine.evaluate_comment(&comment()).await.unwrap(), BanReason::None);
  assert_eq!(engine.gateway().calls(), vec![expected_fetch()]);
}

#[tokio::test]
async fn second_rule_fires() {
  let engine = Engine::new(
    FakeGateway::with_users(vec![bob("1.1.2000")]),
    rules(&[(Some("Peter Tosh"), None), (None, Some("1.1.2000"))]),
  );
  assert_eq!(engine.evaluate_comment(&comment()).await.unwrap(), BanReason::PersonNonGrata);
}

#[tokio::test]
async fn vacuous_rule_never_bans() {
  let engine = Engine::new(FakeGateway::with_users(vec![bob("")]), rules(&[(None, None)]));
  assert_eq!(engine.evaluate_comment(&comment()).await.unwrap(), BanReason::None);
}

// ─── Cache ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn second_evaluation_uses_cache() {
  let engine = Engine::new(FakeGateway::with_users(vec![bob("")]), rules(&[(Some("Bob"), None)]));

  let first = engine.evaluate_comment(&comment()).await.unwrap();
  let second = engine.evaluate_comment(&comment()).await.unwrap();

  assert_eq!(first, BanReason::None);
  assert_eq!(second, first);
  assert_eq!(engine.gateway().fetch_count(), 1);
  assert_eq!(engine.cache().len(), 1);
}

#[tokio::test]
async fn cached_match_bans_again() {
  let engine = Engine::new(
    FakeGateway::with_users(vec![bob("")]),
    rules(&[(Some("Bob Marley"), None)]),
  );
  engine.evaluate_comment(&comment()).await.unwrap();
  let reason = engine
    .evaluate_comment(&Comment { id: 2, ..comment() })
    .await
    .unwrap();
  assert_eq!(reason, BanReason::PersonNonGrata);
  assert_eq!(engine.gateway().fetch_count(), 1);
  assert!(engine.gateway().calls().contains(&Call::Delete { owner_id: OWNER, comment_id: 2 }));
}

#[tokio::test]
async fn concurrent_evaluations_share_cache() {
  let engine = Arc::new(Engine::new(
    FakeGateway::with_users(vec![bob("")]),
    rules(&[(Some("Peter Tosh"), None)]),
  ));
  let tasks: Vec<_> = (0..16)
    .map(|id| {
      let engine = Arc::clone(&engine);
      tokio::spawn(async move {
        engine.evaluate_comment(&Comment { id, ..comment() }).await
      })
    })
    .collect();
  for task in tasks {
    assert_eq!(task.await.unwrap().unwrap(), BanReason::None);
  }
  assert_eq!(engine.cache().len(), 1);
  assert!(engine.gateway().fetch_count() >= 1);
}

// ─── Enforcement failures ────────────────────────────────────────────────────

#[tokio::test]
async fn ban_failure_skips_delete() {
  let gateway = FakeGateway { ban: Reply::Fail, ..FakeGateway::with_users(vec![bob("")]) };
  let engine = Engine::new(gateway, rules(&[(Some("Bob Marley"), None)]));
  let err = engine.evaluate_comment(&comment()).await.unwrap_err();
  assert!(matches!(err, EvaluateError::Ban { source: Error::Transport(_), .. }), "{err}");
  assert_eq!(err.reason(), BanReason::PersonNonGrata);
  assert_eq!(engine.gateway().calls(), vec![expected_fetch(), expected_ban()]);
}

#[tokio::test]
async fn ban_bad_status_is_bad_response() {
  let gateway = FakeGateway { ban: Reply::Status(0), ..FakeGateway::with_users(vec![bob("")]) };
  let engine = Engine::new(gateway, rules(&[(Some("Bob Marley"), None)]));
  let err = engine.evaluate_comment(&comment()).await.unwrap_err();
  assert!(
    matches!(err, EvaluateError::Ban { source: Error::BadResponse { status: 0, .. }, .. }),
    "{err}"
  );
  assert!(!engine.gateway().calls().contains(&expected_delete()));
}

#[tokio::test]
async fn delete_failure_keeps_ban() {
  let gateway = FakeGateway { delete: Reply::Fail, ..FakeGateway::with_users(vec![bob("")]) };
  let engine = Engine::new(gateway, rules(&[(Some("Bob Marley"), None)]));
  let err = engine.evaluate_comment(&comment()).await.unwrap_err();
  assert!(matches!(err, EvaluateError::Delete { .. }), "{err}");
  assert_eq!(err.reason(), BanReason::PersonNonGrata);
  assert!(err.to_string().starts_with("failed to delete comment"));
  assert_eq!(
    engine.gateway().calls(),
    vec![expected_fetch(), expected_ban(), expected_delete()]
  );
}

#[tokio::test]
async fn delete_bad_status_is_bad_response() {
  let gateway = FakeGateway { delete: Reply::Status(2), ..FakeGateway::with_users(vec![bob("")]) };
  let engine = Engine::new(gateway, rules(&[(Some("Bob Marley"), None)]));
  let err = engine.evaluate_comment(&comment()).await.unwrap_err();
  assert!(matches!(
    err,
    EvaluateError::Delete {
      reason: BanReason::PersonNonGrata,
      source: Error::BadResponse { operation: "wall.deleteComment", status: 2 },
    }
  ));
}

#[tokio::test]
async fn unflippable_owner_fails_ban_without_calling_gateway() {
  let gateway = FakeGateway::with_users(vec![bob("")]);
  let engine = Engine::new(gateway, rules(&[(Some("Bob Marley"), None)]));
  let comment = Comment { owner_id: i64::MIN, ..comment() };
  let err = engine.evaluate_comment(&comment).await.unwrap_err();
  assert!(
    matches!(err, EvaluateError::Ban { source: Error::InvalidOwner(i64::MIN), .. }),
    "{err}"
  );
  assert_eq!(err.reason(), BanReason::PersonNonGrata);
  assert_eq!(engine.gateway().calls(), vec![expected_fetch()]);
}

#[test]
fn group_id_sign_is_flipped() {
  assert_eq!(ban_group_id(-61061413).unwrap(), 61061413);
  assert!(matches!(ban_group_id(i64::MIN), Err(Error::InvalidOwner(i64::MIN))));
}
