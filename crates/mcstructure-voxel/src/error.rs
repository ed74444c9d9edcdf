//! Error types for block state lookup and tag tree decoding.

use thiserror::Error;

/// Errors produced by [`BlockState`](crate::BlockState) lookups and structure decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    /// A required key is missing, has the wrong tag kind, or holds an invalid value.
    #[error("invalid schema at '{path}': {reason}")]
    InvalidSchema {
        /// Dotted path of the offending key, e.g. `structure.block_indices[1]`.
        path: String,
        /// What was wrong with it.
        reason: String,
    },
    /// A block state has no attribute with this key.
    #[error("block state has no attribute '{0}'")]
    NotFound(String),
}

impl StructureError {
    pub(crate) fn schema(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSchema {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Path of the offending key for schema errors.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::InvalidSchema { path, .. } => Some(path),
            Self::NotFound(_) => None,
        }
    }
}
