/// Errors from foundation type construction and parsing.
#[derive(Debug, thiserror::Error)]
pub enum TypeError {
    /// The raw path string cannot be used as a config path.
    #[error("invalid config path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// A revision id string could not be parsed.
    #[error("invalid revision id {0:?}")]
    InvalidId(String),
}

/// Result alias for type-level operations.
pub type TypeResult<T> = Result<T, TypeError>;
