//! VK API backend for the banhammer [`Gateway`](banhammer_core::gateway::Gateway).
//!
//! Wraps a [`reqwest::Client`] and speaks the `https://api.vk.com/method`
//! JSON protocol. Only the three methods the engine needs are implemented.

mod client;
mod wire;

pub mod error;

pub use client::{DEFAULT_API_VERSION, DEFAULT_BASE_URL, VkClient, VkConfig};
pub use error::{Error, Result};
