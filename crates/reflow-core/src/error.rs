//! Error types for reflow.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid resource payload: {0}")]
    InvalidResource(String),

    #[error("duplicate definition: {0}")]
    Duplicate(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;
