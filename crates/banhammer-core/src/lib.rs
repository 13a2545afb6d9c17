//! Comment-evaluation core for the banhammer moderation webhook.
//!
//! This crate is deliberately free of HTTP dependencies. The remote social
//! network is reached only through the [`gateway::Gateway`] trait; transport
//! and configuration live in other crates.

pub mod cache;
pub mod comment;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod profile;
pub mod rules;

pub use error::{Error, EvaluateError, Result};

#[cfg(test)]
mod tests;
