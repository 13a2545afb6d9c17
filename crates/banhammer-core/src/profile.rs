//! User profiles as returned by the remote gateway.

use serde::{Deserialize, Serialize};

/// A social-network user. Absent fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
  pub id:         i64,
  pub first_name: String,
  pub last_name:  String,
  /// Free-form `day.month.year` without leading zeros, e.g. `1.11.2000`.
  /// May lack the year or be empty if the user hides it.
  pub birth_date: String,
}

impl UserProfile {
  /// `"<first> <last>"` with exactly one separating space.
  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }
}

/// Optional profile fields that must be requested explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
  BirthDate,
}

impl ProfileField {
  /// Field name understood by the remote API.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::BirthDate => "bdate",
    }
  }
}
