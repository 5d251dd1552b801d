use std::result::Result as StdResult;

use thiserror::Error;

use crate::core::{id::Tag, native::FacadeError};

/// Result type for grove operations.
pub type Result<T> = StdResult<T, Error>;

/// Core error type.
///
/// Only the fatal classes surface here. Snapshot type mismatches and registry
/// lookup misses are absorbed and logged where they are detected.
#[derive(PartialEq, Eq, Error, Debug, Clone)]
pub enum Error {
    #[error("native {op} failed with status {status}")]
    /// A native facade call reported a non-zero status.
    Native {
        /// Facade operation that failed.
        op: &'static str,
        /// Status code returned by the toolkit.
        status: i32,
    },
    #[error("structural: {0}")]
    /// The instance tree would stop mirroring the shadow tree.
    Structural(String),
    #[error("instance not found: {0}")]
    /// A commit referenced a tag that is not in the arena.
    InstanceNotFound(Tag),
    #[error("duplicate tag: {0}")]
    /// A commit created a tag that already exists.
    DuplicateTag(Tag),
    #[error("config: {0}")]
    /// Configuration could not be parsed.
    Config(String),
    #[error("invalid: {0}")]
    /// Invalid input at an API boundary.
    Invalid(String),
    #[error("internal: {0}")]
    /// Internal error.
    Internal(String),
}

impl From<FacadeError> for Error {
    fn from(e: FacadeError) -> Self {
        Self::Native {
            op: e.op,
            status: e.status,
        }
    }
}
