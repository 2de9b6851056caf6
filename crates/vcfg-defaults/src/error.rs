/// Errors from default-pin storage.
#[derive(Debug, thiserror::Error)]
pub enum DefaultError {
    /// The backing store is unreachable or corrupt.
    #[error("default store error: {0}")]
    Backend(String),
}

/// Result alias for default-pin operations.
pub type DefaultResult<T> = Result<T, DefaultError>;
