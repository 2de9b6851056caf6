use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::digest::Digest;
use crate::error::AnnexResult;
use crate::traits::{AnnexReader, AnnexStore};

/// In-memory, HashMap-based annex store.
///
/// Intended for tests and embedding. Blobs are held in memory behind a
/// `RwLock`; `Bytes` handles are cheap to clone, so `get` never copies
/// payload data.
pub struct InMemoryAnnexStore {
    blobs: RwLock<HashMap<Digest, Bytes>>,
}

impl InMemoryAnnexStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of distinct blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored blobs.
    pub fn total_bytes(&self) -> u64 {
        self.blobs
            .read()
            .expect("lock poisoned")
            .values()
            .map(|blob| blob.len() as u64)
            .sum()
    }
}

impl Default for InMemoryAnnexStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnnexStore for InMemoryAnnexStore {
    async fn put(&self, reader: &mut (dyn AsyncRead + Send + Unpin)) -> AnnexResult<Digest> {
        let mut hasher = Digest::hasher();
        let mut content = BytesMut::new();
        let mut chunk = [0u8; 8192];
        loop {
            let n = reader.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            hasher.update(&chunk[..n]);
            content.extend_from_slice(&chunk[..n]);
        }
        let digest = hasher.finalize();

        let mut map = self.blobs.write().expect("lock poisoned");
        // Idempotent: racing writers of identical content collapse to the
        // first insert.
        map.entry(digest).or_insert_with(|| content.freeze());
        Ok(digest)
    }

    async fn get(&self, digest: &Digest) -> AnnexResult<Option<AnnexReader>> {
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map
            .get(digest)
            .cloned()
            .map(|blob| Box::new(std::io::Cursor::new(blob)) as AnnexReader))
    }

    async fn contains(&self, digest: &Digest) -> AnnexResult<bool> {
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map.contains_key(digest))
    }
}

impl std::fmt::Debug for InMemoryAnnexStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryAnnexStore")
            .field("blob_count", &self.len())
            .finish()
    }
}
