use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use vcfg_types::{ConfigId, ConfigPath, HistoryEntry};

use crate::error::RevLogResult;

/// Ordered, append-only, per-path commit log.
///
/// This is the engine's durable backing store, consumed as a black box:
/// any implementation that assigns strictly-increasing-per-path ids at
/// commit time, timestamps each commit, and serves byte content at a given
/// revision satisfies the contract. The engine never asks the log to
/// interpret content.
///
/// Implementations must be thread-safe (`Send + Sync`). Appends to one
/// path must behave as a single total order; appends to different paths
/// are independent.
#[async_trait]
pub trait RevisionLog: Send + Sync {
    /// Append a revision to the path's stream, returning the assigned id.
    ///
    /// Creates the stream if the path has never been committed to (or was
    /// removed). Ids are never reused, even across remove/recreate.
    async fn commit(
        &self,
        path: &ConfigPath,
        content: Bytes,
        comment: &str,
    ) -> RevLogResult<ConfigId>;

    /// Byte content at exactly the given revision of the given path.
    ///
    /// Returns `Ok(None)` if the id is unknown for this path; ids from
    /// other paths' streams never match.
    async fn read(&self, path: &ConfigPath, id: ConfigId) -> RevLogResult<Option<Bytes>>;

    /// Byte content of the path's newest revision.
    ///
    /// Returns `Ok(None)` if the path is inactive. Backends may override
    /// the default two-step lookup with something cheaper.
    async fn read_latest(&self, path: &ConfigPath) -> RevLogResult<Option<Bytes>> {
        match self.log_limited(path, 1).await?.first() {
            Some(entry) => self.read(path, entry.id).await,
            None => Ok(None),
        }
    }

    /// The latest revision whose commit time is `<= time`, with its
    /// content ("as of" semantics).
    ///
    /// Ties at identical timestamps resolve to the most recently committed
    /// of the tied set; commit order is authoritative. Returns `Ok(None)`
    /// if the time precedes the stream's first commit or the path is
    /// inactive.
    async fn read_at(
        &self,
        path: &ConfigPath,
        time: DateTime<Utc>,
    ) -> RevLogResult<Option<(ConfigId, Bytes)>>;

    /// Revision metadata for the path, newest-first.
    ///
    /// Empty if the path is inactive.
    async fn log(&self, path: &ConfigPath) -> RevLogResult<Vec<HistoryEntry>>;

    /// The first `max` entries of [`log`](Self::log) (newest-first, so
    /// the `max` most recent revisions).
    async fn log_limited(
        &self,
        path: &ConfigPath,
        max: usize,
    ) -> RevLogResult<Vec<HistoryEntry>> {
        let mut entries = self.log(path).await?;
        entries.truncate(max);
        Ok(entries)
    }

    /// Deactivate a path.
    ///
    /// Fails with [`RevLogError::NotFound`](crate::RevLogError::NotFound)
    /// if the path is not active. Whether old revisions remain queryable
    /// afterwards is backend-defined; the engine relies only on the path
    /// no longer being listed or readable without an explicit revision.
    async fn remove(&self, path: &ConfigPath) -> RevLogResult<()>;

    /// All active paths, sorted lexicographically.
    async fn list(&self) -> RevLogResult<Vec<ConfigPath>>;

    /// Whether the path currently has an active stream.
    async fn exists(&self, path: &ConfigPath) -> RevLogResult<bool>;
}
