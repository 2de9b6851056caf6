use vcfg_annex::AnnexError;
use vcfg_defaults::DefaultError;
use vcfg_revlog::RevLogError;
use vcfg_types::{ConfigId, ConfigPath, TypeError};

/// Errors from config engine operations.
///
/// Validation failures are rejected before any backend call; backend
/// failures are surfaced verbatim, never substituted with defaults or
/// stale values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The supplied path string is malformed.
    #[error(transparent)]
    InvalidPath(#[from] TypeError),

    /// `create` was called on a path that is already active.
    #[error("file already exists: {0}")]
    FileAlreadyExists(ConfigPath),

    /// The operation requires an active path and none exists.
    #[error("file not found: {0}")]
    FileNotFound(ConfigPath),

    /// `set_default` referenced a revision outside the path's history.
    #[error("revision {id} is not in the history of {path}")]
    InvalidRevision { path: ConfigPath, id: ConfigId },

    /// Annex store failure (including a pointer to a missing blob).
    #[error(transparent)]
    Annex(#[from] AnnexError),

    /// Revision log failure.
    #[error(transparent)]
    RevLog(#[from] RevLogError),

    /// Default-pin store failure.
    #[error(transparent)]
    Defaults(#[from] DefaultError),

    /// I/O failure while materializing or streaming content.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for engine operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
