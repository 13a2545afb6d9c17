//! Error type for `banhammer-vk`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The API answered with an error envelope.
  #[error("{method} failed with error {code}: {message}")]
  Api {
    method:  &'static str,
    code:    i64,
    message: String,
  },

  /// The envelope carried neither a response nor an error.
  #[error("{method} returned an empty envelope")]
  MissingResponse { method: &'static str },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
