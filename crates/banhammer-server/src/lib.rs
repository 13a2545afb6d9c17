//! Callback transport for the banhammer moderation webhook.
//!
//! Exposes an axum [`Router`] that accepts VK Callback API events, runs new
//! wall comments through an [`Engine`], and acknowledges every event with
//! `ok` regardless of the moderation outcome.

pub mod callback;
pub mod error;
pub mod heuristics;

pub use error::Error;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  BoxError,
  Router,
  body::Bytes,
  error_handling::HandleErrorLayer,
  extract::State,
  http::StatusCode,
  response::{IntoResponse, Response},
  routing::post,
};
use banhammer_core::{cache, comment::Comment, engine::Engine, gateway::Gateway};
use banhammer_vk::{DEFAULT_API_VERSION, DEFAULT_BASE_URL, VkConfig};
use serde::Deserialize;
use tower::{ServiceBuilder, timeout::{TimeoutLayer, error::Elapsed}};
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;

use callback::{CONFIRMATION, CallbackRequest, WALL_REPLY_NEW};

/// Body of every acknowledgement.
const ACK: &str = "ok";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `BANHAMMER_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                       String,
  #[serde(default = "default_port")]
  pub port:                       u16,
  /// Community access token for the VK API.
  pub api_token:                  String,
  #[serde(default = "default_api_base_url")]
  pub api_base_url:               String,
  #[serde(default = "default_api_version")]
  pub api_version:                String,
  /// Timeout of a single VK API call.
  #[serde(default = "default_request_timeout_secs")]
  pub request_timeout_secs:       u64,
  /// Deadline for handling one callback request, enforcement included.
  #[serde(default = "default_callback_timeout_ms")]
  pub callback_timeout_ms:        u64,
  /// String the server must return for the `confirmation` event.
  pub callback_confirmation_code: String,
  /// If set, events whose `secret` differs are rejected.
  #[serde(default)]
  pub callback_secret:            Option<String>,
  #[serde(default = "default_heuristics_path")]
  pub heuristics_path:            PathBuf,
  #[serde(default = "default_cache_capacity")]
  pub cache_capacity:             usize,
  /// Default log level (`error` through `trace`). `RUST_LOG` takes
  /// precedence.
  #[serde(default)]
  pub log_level:                  Option<String>,
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_api_base_url() -> String { DEFAULT_BASE_URL.to_string() }
fn default_api_version() -> String { DEFAULT_API_VERSION.to_string() }
fn default_request_timeout_secs() -> u64 { 30 }
fn default_callback_timeout_ms() -> u64 { 10_000 }
fn default_heuristics_path() -> PathBuf { PathBuf::from("heuristics.toml") }
fn default_cache_capacity() -> usize { cache::DEFAULT_CAPACITY }

impl ServerConfig {
  pub fn validate(&self) -> Result<(), Error> {
    if self.api_token.is_empty() {
      return Err(Error::InvalidConfig("api_token must not be empty".into()));
    }
    if self.callback_confirmation_code.is_empty() {
      return Err(Error::InvalidConfig(
        "callback_confirmation_code must not be empty".into(),
      ));
    }
    if self.cache_capacity == 0 {
      return Err(Error::InvalidConfig("cache_capacity must be positive".into()));
    }
    if self.callback_timeout_ms == 0 {
      return Err(Error::InvalidConfig("callback_timeout_ms must be positive".into()));
    }
    self.log_level()?;
    Ok(())
  }

  /// The level used when `RUST_LOG` is unset, `info` unless configured.
  pub fn log_level(&self) -> Result<LevelFilter, Error> {
    match self.log_level.as_deref() {
      None => Ok(LevelFilter::INFO),
      Some(level) => level
        .parse()
        .map_err(|_| Error::InvalidConfig(format!("unknown log_level {level:?}"))),
    }
  }

  pub fn callback_timeout(&self) -> Duration { Duration::from_millis(self.callback_timeout_ms) }

  pub fn vk_config(&self) -> VkConfig {
    VkConfig {
      base_url:     self.api_base_url.clone(),
      access_token: self.api_token.clone(),
      api_version:  self.api_version.clone(),
      timeout:      Duration::from_secs(self.request_timeout_secs),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<G> {
  pub engine: Arc<Engine<G>>,
  pub config: Arc<ServerConfig>,
}

impl<G> Clone for AppState<G> {
  fn clone(&self) -> Self {
    Self {
      engine: Arc::clone(&self.engine),
      config: Arc::clone(&self.config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the callback endpoint.
///
/// `/new_message` is kept as an alias of `/callback` for communities that
/// were registered with the older path. Requests running past
/// [`ServerConfig::callback_timeout`] are answered with 408.
pub fn router<G>(state: AppState<G>) -> Router
where
  G: Gateway + 'static,
{
  let deadline = state.config.callback_timeout();
  Router::new()
    .route("/callback",    post(callback_handler::<G>))
    .route("/new_message", post(callback_handler::<G>))
    .layer(
      ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(HandleErrorLayer::new(handle_layer_error))
        .layer(TimeoutLayer::new(deadline)),
    )
    .with_state(state)
}

async fn handle_layer_error(err: BoxError) -> StatusCode {
  if err.is::<Elapsed>() {
    tracing::warn!("callback request timed out");
    StatusCode::REQUEST_TIMEOUT
  } else {
    tracing::error!(error = %err, "unhandled middleware error");
    StatusCode::INTERNAL_SERVER_ERROR
  }
}

// ─── Handlers ─────────────────────────────────────────────────────────────────

async fn callback_handler<G>(
  State(state): State<AppState<G>>,
  body: Bytes,
) -> Response
where
  G: Gateway + 'static,
{
  let request: CallbackRequest = match serde_json::from_slice(&body) {
    Ok(r) => r,
    Err(e) => {
      tracing::error!(error = %e, "failed to decode callback request");
      return ACK.into_response();
    }
  };

  // The confirmation handshake carries no secret.
  if request.kind == CONFIRMATION {
    return state.config.callback_confirmation_code.clone().into_response();
  }

  if let Some(secret) = &state.config.callback_secret
    && request.secret.as_deref() != Some(secret.as_str())
  {
    tracing::warn!(group_id = request.group_id, "callback secret mismatch");
    return Error::Forbidden.into_response();
  }

  match request.kind.as_str() {
    WALL_REPLY_NEW => {
      wall_reply_new(&state, request).await;
      ACK.into_response()
    }
    other => {
      tracing::debug!(kind = other, "ignoring callback event");
      ACK.into_response()
    }
  }
}

/// Evaluate a new comment. Outcomes are only logged; the event is
/// acknowledged either way.
async fn wall_reply_new<G>(state: &AppState<G>, request: CallbackRequest)
where
  G: Gateway + 'static,
{
  let comment: Comment = match serde_json::from_value(request.object) {
    Ok(c) => c,
    Err(e) => {
      tracing::error!(error = %e, event_id = ?request.event_id, "failed to decode comment");
      return;
    }
  };

  match state.engine.evaluate_comment(&comment).await {
    Ok(reason) => {
      tracing::info!(comment_id = comment.id, author_id = comment.author_id, %reason, "comment checked");
    }
    Err(e) if e.reason().is_none() => {
      tracing::warn!(comment_id = comment.id, author_id = comment.author_id, error = %e, "failed to check comment");
    }
    Err(e) => {
      tracing::error!(
        comment_id = comment.id,
        author_id = comment.author_id,
        reason = %e.reason(),
        error = %e,
        "rule fired but enforcement failed"
      );
    }
  }
}

// ─── Integration tests ────────────────────────────────────────────────────────
