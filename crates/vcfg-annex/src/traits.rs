use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::digest::Digest;
use crate::error::AnnexResult;

/// Lazy byte source handed out by [`AnnexStore::get`].
///
/// Finite and single-pass; callers that need the whole payload in memory
/// materialize it explicitly.
pub type AnnexReader = Box<dyn AsyncRead + Send + Unpin>;

/// Content-addressed storage for oversize payloads.
///
/// All implementations must satisfy these invariants:
/// - Blobs are immutable once written. Content-addressing guarantees this:
///   the same bytes always produce the same digest.
/// - `put` is idempotent. Concurrent puts of identical content collapse to
///   one stored blob with no corruption and no duplicate digests.
/// - There is no delete: blob lifecycle is store-wide policy, not something
///   the config engine drives.
/// - All I/O errors are propagated, never silently ignored.
#[async_trait]
pub trait AnnexStore: Send + Sync {
    /// Stream content into the store, returning its digest.
    ///
    /// The reader is consumed to EOF and hashed as it is read, so oversize
    /// payloads are never buffered whole.
    async fn put(&self, reader: &mut (dyn AsyncRead + Send + Unpin)) -> AnnexResult<Digest>;

    /// Open a lazy reader over a stored blob.
    ///
    /// Returns `Ok(None)` if the digest is unknown.
    async fn get(&self, digest: &Digest) -> AnnexResult<Option<AnnexReader>>;

    /// Check whether a blob exists in the store.
    async fn contains(&self, digest: &Digest) -> AnnexResult<bool>;
}
