use crate::digest::Digest;

/// Errors from annex store operations.
#[derive(Debug, thiserror::Error)]
pub enum AnnexError {
    /// The requested blob was not found.
    #[error("annex blob not found: {0}")]
    NotFound(Digest),

    /// A digest string could not be decoded.
    #[error("invalid digest {digest:?}: {reason}")]
    InvalidDigest { digest: String, reason: String },

    /// Committed pointer bytes do not form a valid pointer record.
    #[error("malformed pointer record: {reason}")]
    MalformedPointer { reason: String },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for annex operations.
pub type AnnexResult<T> = Result<T, AnnexError>;
