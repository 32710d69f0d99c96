//! Error type for the server's own collaborators.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("attachment i/o error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
