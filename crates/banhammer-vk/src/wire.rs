//! Wire shapes of VK API responses.

use banhammer_core::profile::UserProfile;
use serde::Deserialize;

use crate::{Error, Result};

/// Every method answers with either `{"response": ...}` or
/// `{"error": {...}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
  pub response: Option<T>,
  pub error:    Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
  pub error_code: i64,
  #[serde(default)]
  pub error_msg:  String,
}

impl<T> Envelope<T> {
  pub fn into_result(self, method: &'static str) -> Result<T> {
    if let Some(error) = self.error {
      return Err(Error::Api {
        method,
        code: error.error_code,
        message: error.error_msg,
      });
    }
    self.response.ok_or(Error::MissingResponse { method })
  }
}

/// An element of the `users.get` response.
#[derive(Debug, Deserialize)]
pub(crate) struct User {
  pub id:         i64,
  #[serde(default)]
  pub first_name: String,
  #[serde(default)]
  pub last_name:  String,
  #[serde(default)]
  pub bdate:      String,
}

impl From<User> for UserProfile {
  fn from(user: User) -> Self {
    UserProfile {
      id:         user.id,
      first_name: user.first_name,
      last_name:  user.last_name,
      birth_date: user.bdate,
    }
  }
}
