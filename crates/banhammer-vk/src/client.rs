//! Async HTTP client for the VK API.

use std::time::Duration;

use banhammer_core::{
  gateway::{BanRequest, Gateway},
  profile::{ProfileField, UserProfile},
};
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::{
  Result,
  wire::{Envelope, User},
};

pub const DEFAULT_BASE_URL: &str = "https://api.vk.com/method";
pub const DEFAULT_API_VERSION: &str = "5.131";

/// Connection settings for the VK API.
#[derive(Debug, Clone)]
pub struct VkConfig {
  pub base_url:     String,
  /// Community access token with the `manage` and `wall` scopes.
  pub access_token: String,
  pub api_version:  String,
  pub timeout:      Duration,
}

impl VkConfig {
  pub fn new(access_token: impl Into<String>) -> Self {
    Self {
      base_url:     DEFAULT_BASE_URL.to_string(),
      access_token: access_token.into(),
      api_version:  DEFAULT_API_VERSION.to_string(),
      timeout:      Duration::from_secs(30),
    }
  }
}

/// VK API client implementing [`Gateway`].
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct VkClient {
  client: Client,
  config: VkConfig,
}

impl VkClient {
  pub fn new(config: VkConfig) -> Result<Self> {
    let client = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { client, config })
  }

  fn url(&self, method: &str) -> String {
    format!("{}/{}", self.config.base_url.trim_end_matches('/'), method)
  }

  /// `POST /method/<method>` with form parameters, unwrapping the response
  /// envelope.
  async fn call<T: DeserializeOwned>(
    &self,
    method: &'static str,
    params: &[(&str, String)],
  ) -> Result<T> {
    let mut form: Vec<(&str, &str)> =
      params.iter().map(|(k, v)| (*k, v.as_str())).collect();
    form.push(("access_token", &self.config.access_token));
    form.push(("v", &self.config.api_version));

    let envelope: Envelope<T> = self
      .client
      .post(self.url(method))
      .form(&form)
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;
    envelope.into_result(method)
  }

  /// `users.get`
  pub async fn users_get(
    &self,
    user_id: i64,
    fields: &[ProfileField],
  ) -> Result<Vec<UserProfile>> {
    let fields = fields
      .iter()
      .map(|f| f.as_str())
      .collect::<Vec<_>>()
      .join(",");
    let users: Vec<User> = self
      .call("users.get", &[
        ("user_ids", user_id.to_string()),
        ("fields", fields),
      ])
      .await?;
    Ok(users.into_iter().map(UserProfile::from).collect())
  }

  /// `groups.ban`
  pub async fn groups_ban(&self, request: &BanRequest) -> Result<i64> {
    self
      .call("groups.ban", &[
        ("group_id", request.group_id.to_string()),
        ("owner_id", request.user_id.to_string()),
        ("comment", request.comment.clone()),
        ("comment_visible", u8::from(request.comment_visible).to_string()),
      ])
      .await
  }

  /// `wall.deleteComment`
  pub async fn wall_delete_comment(&self, owner_id: i64, comment_id: i64) -> Result<i64> {
    self
      .call("wall.deleteComment", &[
        ("owner_id", owner_id.to_string()),
        ("comment_id", comment_id.to_string()),
      ])
      .await
  }
}

impl Gateway for VkClient {
  type Error = crate::Error;

  async fn fetch_users<'a>(
    &'a self,
    user_id: i64,
    fields: &'a [ProfileField],
  ) -> Result<Vec<UserProfile>> {
    tracing::debug!(user_id, "users.get");
    self.users_get(user_id, fields).await
  }

  async fn ban_user(&self, request: BanRequest) -> Result<i64> {
    tracing::debug!(group_id = request.group_id, user_id = request.user_id, "groups.ban");
    self.groups_ban(&request).await
  }

  async fn delete_comment(&self, owner_id: i64, comment_id: i64) -> Result<i64> {
    tracing::debug!(owner_id, comment_id, "wall.deleteComment");
    self.wall_delete_comment(owner_id, comment_id).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn url_joins_method() {
    let mut config = VkConfig::new("token");
    config.base_url = "http://localhost:9000/method/".to_string();
    let client = VkClient::new(config).unwrap();
    assert_eq!(client.url("users.get"), "http://localhost:9000/method/users.get");
  }

  #[test]
  fn defaults() {
    let config = VkConfig::new("token");
    assert_eq!(config.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.api_version, "5.131");
    assert_eq!(config.timeout, Duration::from_secs(30));
  }

  #[tokio::test]
  async fn unreachable_host_is_http_error() {
    let mut config = VkConfig::new("token");
    config.base_url = "http://127.0.0.1:9/method".to_string();
    config.timeout = Duration::from_secs(2);
    let client = VkClient::new(config).unwrap();
    let err = client.wall_delete_comment(-1, 1).await.unwrap_err();
    assert!(matches!(err, crate::Error::Http(_)), "{err}");
  }
}
