//! Heuristic rules deciding whether a user should be banned.
//!
//! Rules are declarative: each one is a conjunction of optional predicates
//! over a [`UserProfile`]. A rule set is evaluated in order and the first rule
//! that fires determines the [`BanReason`].

use std::{fmt, sync::LazyLock};

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, profile::UserProfile};

/// Day and month without leading zeros, four-digit year, e.g. `19.9.1921`.
static BIRTH_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^([1-9]|[12]\d|3[01])\.([1-9]|1[0-2])\.\d{4}$")
    .expect("birth date pattern is a valid regex")
});

// ─── BanReason ───────────────────────────────────────────────────────────────

/// Outcome category of a comment evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BanReason {
  None,
  PersonNonGrata,
}

impl BanReason {
  /// Textual form; sent to the remote API as the ban comment.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::None => "none",
      Self::PersonNonGrata => "person_non_grata",
    }
  }

  pub fn is_none(self) -> bool { matches!(self, Self::None) }
}

impl fmt::Display for BanReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Person non grata ────────────────────────────────────────────────────────

/// Matches a specific person by name and/or birth date.
///
/// Every declared predicate must hold for the rule to fire. A rule that
/// declares nothing never fires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonNonGrataRule {
  /// Exact `"<first> <last>"`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name:       Option<String>,
  /// Exact textual birth date, e.g. `1.11.2000`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub birth_date: Option<String>,
}

impl PersonNonGrataRule {
  pub fn matches(&self, profile: &UserProfile) -> bool {
    let declared = self.declared_count();
    declared > 0 && self.satisfied_count(profile) == declared
  }

  fn declared_count(&self) -> usize {
    usize::from(self.name.is_some()) + usize::from(self.birth_date.is_some())
  }

  fn satisfied_count(&self, profile: &UserProfile) -> usize {
    let mut satisfied = 0;
    if let Some(name) = &self.name
      && profile.full_name() == *name
    {
      satisfied += 1;
    }
    if let Some(birth_date) = &self.birth_date
      && profile.birth_date == *birth_date
    {
      satisfied += 1;
    }
    satisfied
  }

  fn validate(&self, index: usize) -> Result<()> {
    let invalid = |message: &str| Error::InvalidRule {
      index,
      message: message.to_string(),
    };

    if self.name.as_deref() == Some("") {
      return Err(invalid("empty name in person non grata rule"));
    }
    if let Some(birth_date) = &self.birth_date {
      if !BIRTH_DATE_RE.is_match(birth_date) {
        return Err(invalid("invalid birth date format in person non grata rule"));
      }
      if NaiveDate::parse_from_str(birth_date, "%d.%m.%Y").is_err() {
        return Err(invalid("invalid birth date in person non grata rule"));
      }
    }
    if self.declared_count() == 0 {
      tracing::warn!(index, "person non grata rule declares nothing and will never match");
    }
    Ok(())
  }
}

// ─── RuleSet ─────────────────────────────────────────────────────────────────

/// All configured heuristics. Immutable after load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
  #[serde(default)]
  pub person_non_grata: Vec<PersonNonGrataRule>,
}

impl RuleSet {
  /// Return the reason of the first rule that fires, or `None` if no rule
  /// matches.
  pub fn evaluate(&self, profile: &UserProfile) -> Option<BanReason> {
    self
      .person_non_grata
      .iter()
      .any(|rule| rule.matches(profile))
      .then_some(BanReason::PersonNonGrata)
  }

  pub fn is_empty(&self) -> bool { self.person_non_grata.is_empty() }

  pub fn len(&self) -> usize { self.person_non_grata.len() }

  /// Load-time validation. Evaluation never parses dates, so malformed
  /// values must be rejected here.
  pub fn validate(&self) -> Result<()> {
    if self.is_empty() {
      return Err(Error::NoRules);
    }
    self
      .person_non_grata
      .iter()
      .enumerate()
      .try_for_each(|(index, rule)| rule.validate(index))
  }
}
