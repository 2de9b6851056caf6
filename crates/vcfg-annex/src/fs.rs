use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::debug;

use crate::digest::Digest;
use crate::error::AnnexResult;
use crate::traits::{AnnexReader, AnnexStore};

/// Monotonic suffix for temp file names within this process.
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Filesystem-backed annex store.
///
/// Layout under the root directory:
/// ```text
/// <root>/
///   objects/
///     <2-hex>/
///       <62-hex>      blob content, named by its digest
///   tmp/
///     put-<pid>-<seq> in-flight writes
/// ```
///
/// `put` streams into a unique temp file while hashing, fsyncs, then
/// renames into the digest-named location. A blob path either does not
/// exist or holds complete content; racing writers of identical bytes
/// rename to the same target, which converges because the content is
/// byte-identical.
pub struct FsAnnexStore {
    root: PathBuf,
}

impl FsAnnexStore {
    /// Open (or create) an annex store rooted at the given directory.
    pub async fn open(root: impl Into<PathBuf>) -> AnnexResult<Self> {
        let root = root.into();
        fs::create_dir_all(root.join("objects")).await?;
        fs::create_dir_all(root.join("tmp")).await?;
        Ok(Self { root })
    }

    /// The store's root directory.
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    fn blob_path(&self, digest: &Digest) -> PathBuf {
        let hex = digest.to_hex();
        self.root.join("objects").join(&hex[..2]).join(&hex[2..])
    }

    fn temp_path(&self) -> PathBuf {
        let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
        self.root
            .join("tmp")
            .join(format!("put-{}-{}", std::process::id(), seq))
    }

    /// Stream, hash, and move into place via the given temp file. On any
    /// error the caller removes the temp file; on success the rename (or
    /// the dedup branch) has already consumed it.
    async fn put_via_temp(
        &self,
        reader: &mut (dyn AsyncRead + Send + Unpin),
        temp: &std::path::Path,
    ) -> AnnexResult<Digest> {
        let mut file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(temp)
            .await?;

        let mut hasher = Digest::hasher();
        let mut written: u64 = 0;
        let mut chunk = [0u8; 8192];
        loop {
            let n = reader.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            hasher.update(&chunk[..n]);
            file.write_all(&chunk[..n]).await?;
            written += n as u64;
        }
        file.sync_all().await?;
        drop(file);

        let digest = hasher.finalize();
        let target = self.blob_path(&digest);
        if fs::try_exists(&target).await? {
            // Already stored; the temp copy is redundant.
            fs::remove_file(temp).await?;
            debug!(digest = %digest, len = written, "annex put deduplicated");
            return Ok(digest);
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::rename(temp, &target).await?;
        debug!(digest = %digest, len = written, "annex put stored");
        Ok(digest)
    }
}

#[async_trait]
impl AnnexStore for FsAnnexStore {
    async fn put(&self, reader: &mut (dyn AsyncRead + Send + Unpin)) -> AnnexResult<Digest> {
        let temp = self.temp_path();
        match self.put_via_temp(reader, &temp).await {
            Ok(digest) => Ok(digest),
            Err(e) => {
                // The temp file must not outlive a failed put. Cleanup
                // failure is secondary to the original error.
                let _ = fs::remove_file(&temp).await;
                Err(e)
            }
        }
    }

    async fn get(&self, digest: &Digest) -> AnnexResult<Option<AnnexReader>> {
        match File::open(self.blob_path(digest)).await {
            Ok(file) => Ok(Some(Box::new(file) as AnnexReader)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn contains(&self, digest: &Digest) -> AnnexResult<bool> {
        Ok(fs::try_exists(self.blob_path(digest)).await?)
    }
}
