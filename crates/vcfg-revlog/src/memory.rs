use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::debug;
use vcfg_types::{ConfigId, ConfigPath, HistoryEntry};

use crate::error::{RevLogError, RevLogResult};
use crate::traits::RevisionLog;

/// One committed revision in a stream.
#[derive(Clone, Debug)]
struct StoredRevision {
    id: ConfigId,
    comment: String,
    time: DateTime<Utc>,
    content: Bytes,
}

#[derive(Default)]
struct LogState {
    /// Next id to assign. Global across paths, so ids stay unambiguous
    /// even when a path is removed and recreated.
    next_id: u64,
    /// Append-only revision stream per active path.
    streams: HashMap<ConfigPath, Vec<StoredRevision>>,
}

/// In-memory revision log for tests, local demos, and embedding.
///
/// `remove` drops the whole stream: historical reads of a removed path
/// return `None`. A durable backend is free to retain tombstoned history
/// instead; the trait leaves that choice open.
pub struct InMemoryRevisionLog {
    inner: RwLock<LogState>,
}

impl InMemoryRevisionLog {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LogState {
                next_id: 1,
                streams: HashMap::new(),
            }),
        }
    }

    /// Number of active paths.
    pub fn path_count(&self) -> usize {
        self.inner.read().expect("lock poisoned").streams.len()
    }
}

impl Default for InMemoryRevisionLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RevisionLog for InMemoryRevisionLog {
    async fn commit(
        &self,
        path: &ConfigPath,
        content: Bytes,
        comment: &str,
    ) -> RevLogResult<ConfigId> {
        let mut state = self.inner.write().expect("lock poisoned");
        let id = ConfigId::new(state.next_id);
        state.next_id += 1;

        let stream = state.streams.entry(path.clone()).or_default();
        // Clamp so commit times never run backwards within a stream even
        // if the wall clock does.
        let now = Utc::now();
        let time = match stream.last() {
            Some(last) if last.time > now => last.time,
            _ => now,
        };
        stream.push(StoredRevision {
            id,
            comment: comment.to_string(),
            time,
            content,
        });
        debug!(path = %path, id = %id, "revision committed");
        Ok(id)
    }

    async fn read(&self, path: &ConfigPath, id: ConfigId) -> RevLogResult<Option<Bytes>> {
        let state = self.inner.read().expect("lock poisoned");
        Ok(state
            .streams
            .get(path)
            .and_then(|stream| stream.iter().find(|rev| rev.id == id))
            .map(|rev| rev.content.clone()))
    }

    async fn read_at(
        &self,
        path: &ConfigPath,
        time: DateTime<Utc>,
    ) -> RevLogResult<Option<(ConfigId, Bytes)>> {
        let state = self.inner.read().expect("lock poisoned");
        // Newest-first scan: the first hit is the latest of any set of
        // revisions sharing a timestamp.
        Ok(state.streams.get(path).and_then(|stream| {
            stream
                .iter()
                .rev()
                .find(|rev| rev.time <= time)
                .map(|rev| (rev.id, rev.content.clone()))
        }))
    }

    async fn log(&self, path: &ConfigPath) -> RevLogResult<Vec<HistoryEntry>> {
        let state = self.inner.read().expect("lock poisoned");
        Ok(state
            .streams
            .get(path)
            .map(|stream| {
                stream
                    .iter()
                    .rev()
                    .map(|rev| HistoryEntry {
                        id: rev.id,
                        comment: rev.comment.clone(),
                        time: rev.time,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn remove(&self, path: &ConfigPath) -> RevLogResult<()> {
        let mut state = self.inner.write().expect("lock poisoned");
        if state.streams.remove(path).is_none() {
            return Err(RevLogError::NotFound(path.clone()));
        }
        debug!(path = %path, "revision stream removed");
        Ok(())
    }

    async fn list(&self) -> RevLogResult<Vec<ConfigPath>> {
        let state = self.inner.read().expect("lock poisoned");
        let mut paths: Vec<ConfigPath> = state.streams.keys().cloned().collect();
        paths.sort();
        Ok(paths)
    }

    async fn exists(&self, path: &ConfigPath) -> RevLogResult<bool> {
        let state = self.inner.read().expect("lock poisoned");
        Ok(state.streams.contains_key(path))
    }
}

impl std::fmt::Debug for InMemoryRevisionLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRevisionLog")
            .field("path_count", &self.path_count())
            .finish()
    }
}
