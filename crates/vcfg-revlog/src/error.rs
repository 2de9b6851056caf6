use vcfg_types::ConfigPath;

/// Errors from revision log operations.
#[derive(Debug, thiserror::Error)]
pub enum RevLogError {
    /// The path has no active revision stream.
    #[error("no revision stream for path: {0}")]
    NotFound(ConfigPath),

    /// The backing store is unreachable or returned an inconsistent
    /// result. Always surfaced to the caller, never swallowed.
    #[error("revision backend error: {0}")]
    Backend(String),

    /// I/O error from a storage-backed implementation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for revision log operations.
pub type RevLogResult<T> = Result<T, RevLogError>;
