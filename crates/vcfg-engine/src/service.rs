//! The config engine: orchestrates the revision log, annex store, and
//! default pins into the client-facing versioned-file surface.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info};
use vcfg_annex::{AnnexError, AnnexStore, InMemoryAnnexStore, PointerRecord};
use vcfg_defaults::{DefaultStore, InMemoryDefaultStore};
use vcfg_revlog::{InMemoryRevisionLog, RevLogError, RevisionLog};
use vcfg_types::{ConfigFileInfo, ConfigId, ConfigPath, HistoryEntry};

use crate::data::ConfigData;
use crate::error::{ConfigError, ConfigResult};
use crate::settings::EngineSettings;

/// Where an active path's revisions actually live.
///
/// Storage form is decided once, at create time, and signalled purely by
/// which stream exists: a pointer stream under the suffixed path, or a
/// content stream under the path itself.
enum Stored {
    /// Revisions hold the content verbatim.
    Inline(ConfigPath),
    /// Revisions hold pointer records into the annex store.
    Pointer(ConfigPath),
}

impl Stored {
    fn path(&self) -> &ConfigPath {
        match self {
            Stored::Inline(p) | Stored::Pointer(p) => p,
        }
    }
}

/// The versioned configuration service.
///
/// Every write appends an immutable revision to the path's stream in the
/// revision log; oversize payloads go to the annex store with only a
/// pointer record committed. Mutations of one path are serialized through
/// a per-path lock; operations on different paths never contend, and
/// reads take no lock at all.
pub struct ConfigService {
    revlog: Arc<dyn RevisionLog>,
    annex: Arc<dyn AnnexStore>,
    defaults: Arc<dyn DefaultStore>,
    settings: EngineSettings,
    /// Per-path write serialization. Keyed by the normalized logical path,
    /// so a file and its pointer stream share one lock.
    locks: StdMutex<HashMap<ConfigPath, Arc<AsyncMutex<()>>>>,
}

impl ConfigService {
    pub fn new(
        revlog: Arc<dyn RevisionLog>,
        annex: Arc<dyn AnnexStore>,
        defaults: Arc<dyn DefaultStore>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            revlog,
            annex,
            defaults,
            settings,
            locks: StdMutex::new(HashMap::new()),
        }
    }

    /// Fully in-memory service, for tests and embedding.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryRevisionLog::new()),
            Arc::new(InMemoryAnnexStore::new()),
            Arc::new(InMemoryDefaultStore::new()),
            EngineSettings::default(),
        )
    }

    // ---- Write operations ----

    /// Create a new config file and commit its first revision.
    ///
    /// Fails with [`ConfigError::FileAlreadyExists`] if the path is
    /// already active in either storage form. When `oversize` is set, the
    /// payload is written to the annex store first and a pointer record is
    /// committed in its place; a write that never reaches the commit
    /// leaves no pointer behind, only an unreferenced blob.
    pub async fn create(
        &self,
        path: &str,
        data: ConfigData,
        oversize: bool,
        comment: &str,
    ) -> ConfigResult<ConfigId> {
        let path = ConfigPath::new(path)?;
        let lock = self.path_lock(&path);
        let _guard = lock.lock().await;

        if self.resolve_active(&path).await?.is_some() {
            return Err(ConfigError::FileAlreadyExists(path));
        }

        let (stored, payload) = if oversize {
            let mut reader = data.into_reader();
            let digest = self.annex.put(&mut *reader).await?;
            (
                self.settings.pointer_path(&path),
                PointerRecord::new(digest).encode(),
            )
        } else {
            (path.clone(), data.into_bytes().await?)
        };

        let id = self.revlog.commit(&stored, payload, comment).await?;
        info!(path = %path, id = %id, oversize, "config created");
        Ok(id)
    }

    /// [`create`](Self::create) with an empty comment.
    pub async fn create_uncommented(
        &self,
        path: &str,
        data: ConfigData,
        oversize: bool,
    ) -> ConfigResult<ConfigId> {
        self.create(path, data, oversize, "").await
    }

    /// Commit a new revision of an existing config file.
    ///
    /// The storage form is sticky: whichever form `create` used is
    /// inferred from the existing streams and reused, so callers never
    /// repeat the oversize flag. Fails with [`ConfigError::FileNotFound`]
    /// if the path is not active. Existing default pins are untouched.
    pub async fn update(
        &self,
        path: &str,
        data: ConfigData,
        comment: &str,
    ) -> ConfigResult<ConfigId> {
        let path = ConfigPath::new(path)?;
        let lock = self.path_lock(&path);
        let _guard = lock.lock().await;

        let Some(stored) = self.resolve_active(&path).await? else {
            return Err(ConfigError::FileNotFound(path));
        };
        let payload = match &stored {
            Stored::Pointer(_) => {
                let mut reader = data.into_reader();
                let digest = self.annex.put(&mut *reader).await?;
                PointerRecord::new(digest).encode()
            }
            Stored::Inline(_) => data.into_bytes().await?,
        };

        let id = self.revlog.commit(stored.path(), payload, comment).await?;
        debug!(path = %path, id = %id, "config updated");
        Ok(id)
    }

    /// Delete a config file.
    ///
    /// The path stops existing for `get`/`exists`/`list`, and its default
    /// pin is dropped. What happens to historical revisions is the
    /// revision log's own business. Deleting an inactive path is an
    /// error, not a silent success.
    pub async fn delete(&self, path: &str) -> ConfigResult<()> {
        let path = ConfigPath::new(path)?;
        let lock = self.path_lock(&path);
        let _guard = lock.lock().await;

        let Some(stored) = self.resolve_active(&path).await? else {
            return Err(ConfigError::FileNotFound(path));
        };
        match self.revlog.remove(stored.path()).await {
            Ok(()) => {}
            Err(RevLogError::NotFound(_)) => return Err(ConfigError::FileNotFound(path)),
            Err(e) => return Err(e.into()),
        }
        self.defaults.delete(&path)?;
        // The lock registry entry stays: a writer queued behind this delete
        // still holds the old mutex, and handing a later caller a fresh one
        // would let two mutations on the path run unserialized.
        info!(path = %path, "config deleted");
        Ok(())
    }

    // ---- Read operations ----

    /// Content of the latest revision, or `None` if the path is not
    /// active. Pointer records are dereferenced transparently; callers
    /// never see them.
    pub async fn get(&self, path: &str) -> ConfigResult<Option<ConfigData>> {
        let path = ConfigPath::new(path)?;
        match self.resolve_active(&path).await? {
            Some(Stored::Pointer(stored)) => match self.revlog.read_latest(&stored).await? {
                Some(bytes) => Ok(Some(self.deref_pointer(&bytes).await?)),
                None => Ok(None),
            },
            Some(Stored::Inline(stored)) => Ok(self
                .revlog
                .read_latest(&stored)
                .await?
                .map(ConfigData::from_bytes)),
            None => Ok(None),
        }
    }

    /// Content at exactly the given revision, or `None` if the id is not
    /// part of this path's history.
    pub async fn get_by_id(&self, path: &str, id: ConfigId) -> ConfigResult<Option<ConfigData>> {
        let path = ConfigPath::new(path)?;
        self.get_by_id_resolved(&path, id).await
    }

    /// Content of the latest revision committed at or before `time`, or
    /// `None` if the time precedes the first commit.
    pub async fn get_by_time(
        &self,
        path: &str,
        time: DateTime<Utc>,
    ) -> ConfigResult<Option<ConfigData>> {
        let path = ConfigPath::new(path)?;
        match self.resolve_active(&path).await? {
            Some(Stored::Pointer(stored)) => {
                match self.revlog.read_at(&stored, time).await? {
                    Some((_, bytes)) => Ok(Some(self.deref_pointer(&bytes).await?)),
                    None => Ok(None),
                }
            }
            Some(Stored::Inline(stored)) => Ok(self
                .revlog
                .read_at(&stored, time)
                .await?
                .map(|(_, bytes)| ConfigData::from_bytes(bytes))),
            None => Ok(None),
        }
    }

    /// Content of the path's default revision: the pinned revision if one
    /// is set, otherwise the latest. Until a pin is set the result moves
    /// with new revisions; once pinned it freezes until reset.
    pub async fn get_default(&self, path: &str) -> ConfigResult<Option<ConfigData>> {
        let path = ConfigPath::new(path)?;
        match self.defaults.get(&path)? {
            Some(id) => self.get_by_id_resolved(&path, id).await,
            None => {
                match self.resolve_active(&path).await? {
                    Some(Stored::Pointer(stored)) => {
                        match self.revlog.read_latest(&stored).await? {
                            Some(bytes) => Ok(Some(self.deref_pointer(&bytes).await?)),
                            None => Ok(None),
                        }
                    }
                    Some(Stored::Inline(stored)) => Ok(self
                        .revlog
                        .read_latest(&stored)
                        .await?
                        .map(ConfigData::from_bytes)),
                    None => Ok(None),
                }
            }
        }
    }

    /// Whether the path is currently active in either storage form.
    pub async fn exists(&self, path: &str) -> ConfigResult<bool> {
        let path = ConfigPath::new(path)?;
        Ok(self.resolve_active(&path).await?.is_some())
    }

    /// Revision metadata for the path, newest-first.
    pub async fn history(&self, path: &str) -> ConfigResult<Vec<HistoryEntry>> {
        let path = ConfigPath::new(path)?;
        let Some(stored) = self.resolve_active(&path).await? else {
            return Err(ConfigError::FileNotFound(path));
        };
        Ok(self.revlog.log(stored.path()).await?)
    }

    /// The `max` most recent entries of [`history`](Self::history).
    pub async fn history_limited(
        &self,
        path: &str,
        max: usize,
    ) -> ConfigResult<Vec<HistoryEntry>> {
        let path = ConfigPath::new(path)?;
        let Some(stored) = self.resolve_active(&path).await? else {
            return Err(ConfigError::FileNotFound(path));
        };
        Ok(self.revlog.log_limited(stored.path(), max).await?)
    }

    /// One entry per active stored path, sorted lexicographically, each
    /// carrying the latest revision id and comment. Annex-backed files
    /// list under their suffixed pointer path, which is what the log
    /// tracks.
    pub async fn list(&self) -> ConfigResult<Vec<ConfigFileInfo>> {
        let mut infos = Vec::new();
        for path in self.revlog.list().await? {
            if let Some(latest) = self.revlog.log_limited(&path, 1).await?.into_iter().next() {
                infos.push(ConfigFileInfo::new(path, latest.id, latest.comment));
            }
        }
        Ok(infos)
    }

    // ---- Default-pin operations ----

    /// Pin the path's default revision.
    ///
    /// The id must belong to this path's history; anything else is
    /// rejected with [`ConfigError::InvalidRevision`] and nothing is
    /// stored.
    pub async fn set_default(&self, path: &str, id: ConfigId) -> ConfigResult<()> {
        let path = ConfigPath::new(path)?;
        let lock = self.path_lock(&path);
        let _guard = lock.lock().await;

        let Some(stored) = self.resolve_active(&path).await? else {
            return Err(ConfigError::FileNotFound(path));
        };
        let history = self.revlog.log(stored.path()).await?;
        if !history.iter().any(|entry| entry.id == id) {
            return Err(ConfigError::InvalidRevision { path, id });
        }
        self.defaults.set(&path, id)?;
        debug!(path = %path, id = %id, "default pinned");
        Ok(())
    }

    /// Clear the path's default pin; default reads track latest again.
    /// Resetting an unpinned path is a no-op.
    pub async fn reset_default(&self, path: &str) -> ConfigResult<()> {
        let path = ConfigPath::new(path)?;
        let lock = self.path_lock(&path);
        let _guard = lock.lock().await;
        if self.defaults.reset(&path)? {
            debug!(path = %path, "default unpinned");
        }
        Ok(())
    }

    // ---- Internals ----

    fn path_lock(&self, path: &ConfigPath) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().expect("lock poisoned");
        locks.entry(path.clone()).or_default().clone()
    }

    /// Which stream, if any, is active for this logical path.
    async fn resolve_active(&self, path: &ConfigPath) -> ConfigResult<Option<Stored>> {
        let pointer = self.settings.pointer_path(path);
        if self.revlog.exists(&pointer).await? {
            Ok(Some(Stored::Pointer(pointer)))
        } else if self.revlog.exists(path).await? {
            Ok(Some(Stored::Inline(path.clone())))
        } else {
            Ok(None)
        }
    }

    async fn get_by_id_resolved(
        &self,
        path: &ConfigPath,
        id: ConfigId,
    ) -> ConfigResult<Option<ConfigData>> {
        match self.resolve_active(path).await? {
            Some(Stored::Pointer(stored)) => match self.revlog.read(&stored, id).await? {
                Some(bytes) => Ok(Some(self.deref_pointer(&bytes).await?)),
                None => Ok(None),
            },
            Some(Stored::Inline(stored)) => Ok(self
                .revlog
                .read(&stored, id)
                .await?
                .map(ConfigData::from_bytes)),
            None => Ok(None),
        }
    }

    /// Decode a committed pointer record and open the blob it names.
    /// A dangling pointer is a hard error; it means the annex and the log
    /// disagree and serving anything would be a lie.
    async fn deref_pointer(&self, bytes: &Bytes) -> ConfigResult<ConfigData> {
        let record = PointerRecord::decode(bytes)?;
        let reader = self
            .annex
            .get(&record.digest())
            .await?
            .ok_or(AnnexError::NotFound(record.digest()))?;
        Ok(ConfigData::from_reader(reader))
    }
}

impl std::fmt::Debug for ConfigService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigService")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG_V1: &str =
        "axisName1 = tromboneAxis\naxisName2 = tromboneAxis2\naxisName3 = tromboneAxis3";
    const CONFIG_V2: &str =
        "axisName11 = tromboneAxis\naxisName22 = tromboneAxis2\naxisName3 = tromboneAxis33";
    const CONFIG_V3: &str =
        "axisName111 = tromboneAxis\naxisName222 = tromboneAxis2\naxisName3 = tromboneAxis333";

    fn service_with_annex() -> (ConfigService, Arc<InMemoryAnnexStore>) {
        let annex = Arc::new(InMemoryAnnexStore::new());
        let service = ConfigService::new(
            Arc::new(InMemoryRevisionLog::new()),
            annex.clone(),
            Arc::new(InMemoryDefaultStore::new()),
            EngineSettings::default(),
        );
        (service, annex)
    }

    async fn get_string(service: &ConfigService, path: &str) -> String {
        service
            .get(path)
            .await
            .unwrap()
            .expect("path should be active")
            .into_string()
            .await
            .unwrap()
    }

    async fn settle() {
        // Give the next commit a strictly later timestamp even on coarse
        // clocks.
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    #[tokio::test]
    async fn create_and_retrieve_inline() {
        let service = ConfigService::in_memory();
        service
            .create("test.conf", CONFIG_V1.into(), false, "commit test file")
            .await
            .unwrap();
        assert_eq!(get_string(&service, "test.conf").await, CONFIG_V1);
    }

    #[tokio::test]
    async fn create_and_retrieve_oversize() {
        let service = ConfigService::in_memory();
        service
            .create_uncommented("SomeOversizeFile.txt", CONFIG_V1.into(), true)
            .await
            .unwrap();
        assert_eq!(get_string(&service, "SomeOversizeFile.txt").await, CONFIG_V1);
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected() {
        let service = ConfigService::in_memory();
        service
            .create("test.conf", CONFIG_V1.into(), false, "first")
            .await
            .unwrap();
        assert!(matches!(
            service.create("test.conf", CONFIG_V2.into(), false, "again").await,
            Err(ConfigError::FileAlreadyExists(_))
        ));
        // The annex pointer stream guards the same logical name.
        assert!(matches!(
            service.create("test.conf", CONFIG_V2.into(), true, "again").await,
            Err(ConfigError::FileAlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn update_existing_file() {
        let service = ConfigService::in_memory();
        service
            .create("/assembly.conf", CONFIG_V1.into(), false, "commit assembly conf")
            .await
            .unwrap();
        assert_eq!(get_string(&service, "/assembly.conf").await, CONFIG_V1);

        service
            .update("/assembly.conf", CONFIG_V2.into(), "commit updated assembly conf")
            .await
            .unwrap();
        assert_eq!(get_string(&service, "/assembly.conf").await, CONFIG_V2);
    }

    #[tokio::test]
    async fn update_missing_file_is_rejected() {
        let service = ConfigService::in_memory();
        assert!(matches!(
            service.update("ghost.conf", CONFIG_V1.into(), "no such file").await,
            Err(ConfigError::FileNotFound(_))
        ));
    }

    #[tokio::test]
    async fn specific_version_retrieval() {
        let service = ConfigService::in_memory();
        service
            .create("/a/b/channel.conf", CONFIG_V1.into(), false, "commit channel conf path")
            .await
            .unwrap();
        let middle = service
            .update("/a/b/channel.conf", CONFIG_V2.into(), "commit updated conf path")
            .await
            .unwrap();
        service
            .update("/a/b/channel.conf", CONFIG_V3.into(), "updated config to assembly")
            .await
            .unwrap();

        assert_eq!(get_string(&service, "/a/b/channel.conf").await, CONFIG_V3);
        let at_middle = service
            .get_by_id("/a/b/channel.conf", middle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(at_middle.into_string().await.unwrap(), CONFIG_V2);
    }

    #[tokio::test]
    async fn unknown_revision_is_none() {
        let service = ConfigService::in_memory();
        let id = service
            .create("a.conf", CONFIG_V1.into(), false, "")
            .await
            .unwrap();
        service.create("b.conf", CONFIG_V2.into(), false, "").await.unwrap();

        // b.conf's history does not contain a.conf's id.
        assert!(service.get_by_id("b.conf", id).await.unwrap().is_none());
        assert!(service
            .get_by_id("a.conf", ConfigId::new(999))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn version_retrieval_by_time() {
        let service = ConfigService::in_memory();
        service
            .create("/test.conf", CONFIG_V1.into(), false, "commit initial configuration")
            .await
            .unwrap();
        service
            .update("/test.conf", CONFIG_V2.into(), "updated config to assembly")
            .await
            .unwrap();
        let instant = Utc::now();
        settle().await;
        service
            .update("/test.conf", CONFIG_V3.into(), "updated config to assembly")
            .await
            .unwrap();

        assert_eq!(get_string(&service, "/test.conf").await, CONFIG_V3);
        let as_of = service
            .get_by_time("/test.conf", instant)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(as_of.into_string().await.unwrap(), CONFIG_V2);
    }

    #[tokio::test]
    async fn time_before_first_commit_is_none() {
        let service = ConfigService::in_memory();
        let before = Utc::now() - chrono::Duration::seconds(60);
        service
            .create("/test.conf", CONFIG_V1.into(), false, "")
            .await
            .unwrap();
        assert!(service
            .get_by_time("/test.conf", before)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn history_is_newest_first_and_truncates() {
        let service = ConfigService::in_memory();
        let r1 = service
            .create("/test.conf", CONFIG_V1.into(), false, "commit initial configuration")
            .await
            .unwrap();
        let r2 = service
            .update("/test.conf", CONFIG_V2.into(), "updated config to assembly")
            .await
            .unwrap();
        let r3 = service
            .update("/test.conf", CONFIG_V3.into(), "updated config to assembly")
            .await
            .unwrap();

        let entries = service.history("/test.conf").await.unwrap();
        let ids: Vec<ConfigId> = entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![r3, r2, r1]);

        let limited = service.history_limited("/test.conf", 2).await.unwrap();
        let ids: Vec<ConfigId> = limited.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![r3, r2]);
    }

    #[tokio::test]
    async fn history_of_missing_path_is_an_error() {
        let service = ConfigService::in_memory();
        assert!(matches!(
            service.history("ghost.conf").await,
            Err(ConfigError::FileNotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_is_sorted_by_path() {
        let service = ConfigService::in_memory();
        let trombone_id = service
            .create("trombone.conf", "axisName = tromboneAxis".into(), false, "hello trombone")
            .await
            .unwrap();
        let assembly_id = service
            .create(
                "a/b/assembly/assembly.conf",
                "assemblyHCDCount = 3".into(),
                false,
                "hello assembly",
            )
            .await
            .unwrap();

        assert_eq!(
            service.list().await.unwrap(),
            vec![
                ConfigFileInfo::new(
                    ConfigPath::new("a/b/assembly/assembly.conf").unwrap(),
                    assembly_id,
                    "hello assembly",
                ),
                ConfigFileInfo::new(
                    ConfigPath::new("trombone.conf").unwrap(),
                    trombone_id,
                    "hello trombone",
                ),
            ]
        );
    }

    #[tokio::test]
    async fn list_shows_pointer_paths_for_oversize_files() {
        let service = ConfigService::in_memory();
        let trombone_id = service
            .create("trombone.conf", "axisName = tromboneAxis".into(), true, "oversize no1")
            .await
            .unwrap();
        let assembly_id = service
            .create(
                "a/b/assembly/assembly.conf",
                "assemblyHCDCount = 3".into(),
                true,
                "oversize no2",
            )
            .await
            .unwrap();

        assert_eq!(
            service.list().await.unwrap(),
            vec![
                ConfigFileInfo::new(
                    ConfigPath::new("a/b/assembly/assembly.conf.annex").unwrap(),
                    assembly_id,
                    "oversize no2",
                ),
                ConfigFileInfo::new(
                    ConfigPath::new("trombone.conf.annex").unwrap(),
                    trombone_id,
                    "oversize no1",
                ),
            ]
        );
    }

    #[tokio::test]
    async fn exists_lifecycle() {
        let service = ConfigService::in_memory();
        assert!(!service.exists("/test.conf").await.unwrap());

        service
            .create("a/test.site.conf", CONFIG_V1.into(), false, "commit config file")
            .await
            .unwrap();
        assert!(service.exists("a/test.site.conf").await.unwrap());
        // Leading slash names the same logical entity.
        assert!(service.exists("/a/test.site.conf").await.unwrap());

        service.delete("a/test.site.conf").await.unwrap();
        assert!(!service.exists("a/test.site.conf").await.unwrap());
    }

    #[tokio::test]
    async fn oversize_exists() {
        let service = ConfigService::in_memory();
        service
            .create("a/test.site.conf", CONFIG_V3.into(), true, "create oversize file")
            .await
            .unwrap();
        assert!(service.exists("a/test.site.conf").await.unwrap());
    }

    #[tokio::test]
    async fn get_after_delete_is_none_not_an_error() {
        let service = ConfigService::in_memory();
        service
            .create("tromboneHCD.conf", CONFIG_V1.into(), false, "commit trombone config file")
            .await
            .unwrap();
        assert_eq!(get_string(&service, "tromboneHCD.conf").await, CONFIG_V1);

        service.delete("tromboneHCD.conf").await.unwrap();
        assert!(service.get("tromboneHCD.conf").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_of_missing_path_is_an_error() {
        let service = ConfigService::in_memory();
        assert!(matches!(
            service.delete("ghost.conf").await,
            Err(ConfigError::FileNotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_clears_the_default_pin() {
        let service = ConfigService::in_memory();
        let id = service
            .create("test.conf", CONFIG_V1.into(), false, "")
            .await
            .unwrap();
        service.set_default("test.conf", id).await.unwrap();
        service.delete("test.conf").await.unwrap();

        // Recreate: the old pin must not resurface.
        service
            .create("test.conf", CONFIG_V2.into(), false, "fresh")
            .await
            .unwrap();
        let default = service.get_default("test.conf").await.unwrap().unwrap();
        assert_eq!(default.into_string().await.unwrap(), CONFIG_V2);
    }

    #[tokio::test]
    async fn default_pin_lifecycle() {
        let service = ConfigService::in_memory();
        service
            .create("/test.conf", CONFIG_V1.into(), false, "hello world")
            .await
            .unwrap();
        let pinned = service
            .update("/test.conf", CONFIG_V2.into(), "Updated config to assembly")
            .await
            .unwrap();
        service
            .update("/test.conf", CONFIG_V3.into(), "Updated config to assembly")
            .await
            .unwrap();

        // Unpinned: default tracks latest.
        let default = service.get_default("/test.conf").await.unwrap().unwrap();
        assert_eq!(default.into_string().await.unwrap(), CONFIG_V3);

        // Pinned: frozen to the pinned revision despite later updates.
        service.set_default("/test.conf", pinned).await.unwrap();
        let default = service.get_default("/test.conf").await.unwrap().unwrap();
        assert_eq!(default.into_string().await.unwrap(), CONFIG_V2);

        // Reset: tracking latest again.
        service.reset_default("/test.conf").await.unwrap();
        let default = service.get_default("/test.conf").await.unwrap().unwrap();
        assert_eq!(default.into_string().await.unwrap(), CONFIG_V3);
    }

    #[tokio::test]
    async fn default_pin_lifecycle_oversize() {
        let service = ConfigService::in_memory();
        service
            .create("/test.conf", CONFIG_V1.into(), true, "some comment")
            .await
            .unwrap();
        let pinned = service
            .update("/test.conf", CONFIG_V2.into(), "Updated config to assembly")
            .await
            .unwrap();
        service
            .update("/test.conf", CONFIG_V3.into(), "Updated config")
            .await
            .unwrap();

        let default = service.get_default("/test.conf").await.unwrap().unwrap();
        assert_eq!(default.into_string().await.unwrap(), CONFIG_V3);

        service.set_default("/test.conf", pinned).await.unwrap();
        let default = service.get_default("/test.conf").await.unwrap().unwrap();
        assert_eq!(default.into_string().await.unwrap(), CONFIG_V2);

        service.reset_default("/test.conf").await.unwrap();
        let default = service.get_default("/test.conf").await.unwrap().unwrap();
        assert_eq!(default.into_string().await.unwrap(), CONFIG_V3);
    }

    #[tokio::test]
    async fn set_default_rejects_out_of_history_revisions() {
        let service = ConfigService::in_memory();
        service
            .create("a.conf", CONFIG_V1.into(), false, "")
            .await
            .unwrap();
        let foreign = service
            .create("b.conf", CONFIG_V2.into(), false, "")
            .await
            .unwrap();

        assert!(matches!(
            service.set_default("a.conf", foreign).await,
            Err(ConfigError::InvalidRevision { .. })
        ));
        assert!(matches!(
            service.set_default("ghost.conf", foreign).await,
            Err(ConfigError::FileNotFound(_))
        ));
    }

    #[tokio::test]
    async fn oversize_form_is_sticky_and_deduplicates() {
        let (service, annex) = service_with_annex();
        service
            .create("/test.conf", CONFIG_V1.into(), true, "commit initial configuration")
            .await
            .unwrap();
        // No flag on update; the pointer stream's existence decides.
        service
            .update("/test.conf", CONFIG_V2.into(), "updated config to assembly")
            .await
            .unwrap();
        service
            .update("/test.conf", CONFIG_V3.into(), "updated config to assembly")
            .await
            .unwrap();
        assert_eq!(annex.len(), 3);
        assert_eq!(get_string(&service, "/test.conf").await, CONFIG_V3);

        // A byte-identical revision adds history but no new blob.
        service
            .update("/test.conf", CONFIG_V2.into(), "back to v2")
            .await
            .unwrap();
        assert_eq!(annex.len(), 3);
        assert_eq!(service.history("/test.conf").await.unwrap().len(), 4);
        assert_eq!(get_string(&service, "/test.conf").await, CONFIG_V2);
    }

    #[tokio::test]
    async fn oversize_history_and_time_retrieval() {
        let service = ConfigService::in_memory();
        let r1 = service
            .create("/test.conf", CONFIG_V1.into(), true, "commit initial oversize configuration")
            .await
            .unwrap();
        let r2 = service
            .update("/test.conf", CONFIG_V2.into(), "updated config to assembly")
            .await
            .unwrap();
        let instant = Utc::now();
        settle().await;
        let r3 = service
            .update("/test.conf", CONFIG_V3.into(), "updated config to assembly")
            .await
            .unwrap();

        let ids: Vec<ConfigId> = service
            .history("/test.conf")
            .await
            .unwrap()
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![r3, r2, r1]);

        let as_of = service
            .get_by_time("/test.conf", instant)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(as_of.into_string().await.unwrap(), CONFIG_V2);

        let at_r2 = service.get_by_id("/test.conf", r2).await.unwrap().unwrap();
        assert_eq!(at_r2.into_string().await.unwrap(), CONFIG_V2);
    }

    #[tokio::test]
    async fn invalid_paths_are_rejected_before_any_backend_call() {
        let service = ConfigService::in_memory();
        for bad in ["", "/", "a//b.conf", "a b.conf", "a/../b.conf"] {
            assert!(matches!(
                service.create(bad, CONFIG_V1.into(), false, "").await,
                Err(ConfigError::InvalidPath(_))
            ));
            assert!(matches!(
                service.get(bad).await,
                Err(ConfigError::InvalidPath(_))
            ));
        }
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn large_random_payload_round_trips_oversize() {
        use rand::RngCore;

        let mut payload = vec![0u8; 512 * 1024];
        rand::thread_rng().fill_bytes(&mut payload);

        let service = ConfigService::in_memory();
        service
            .create(
                "big/blob.bin",
                ConfigData::from_bytes(Bytes::from(payload.clone())),
                true,
                "large payload",
            )
            .await
            .unwrap();

        let got = service
            .get("big/blob.bin")
            .await
            .unwrap()
            .unwrap()
            .into_bytes()
            .await
            .unwrap();
        assert_eq!(got, payload);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_updates_serialize_per_path() {
        let service = Arc::new(ConfigService::in_memory());
        service
            .create("shared.conf", "v0".into(), false, "initial")
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..8 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service
                    .update("shared.conf", format!("v{i}").as_str().into(), "concurrent update")
                    .await
                    .unwrap()
            }));
        }
        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }

        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 8, "every update must get a distinct id");

        let entries = service.history("shared.conf").await.unwrap();
        assert_eq!(entries.len(), 9);
        for pair in entries.windows(2) {
            assert!(pair[0].id > pair[1].id);
            assert!(pair[0].time >= pair[1].time);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_on_distinct_paths_do_not_interfere() {
        let service = Arc::new(ConfigService::in_memory());
        let mut handles = Vec::new();
        for i in 0..8 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                let path = format!("dir/file-{i}.conf");
                service
                    .create(&path, format!("content {i}").as_str().into(), i % 2 == 0, "")
                    .await
                    .unwrap();
                path
            }));
        }
        for handle in handles {
            let path = handle.await.unwrap();
            assert!(service.exists(&path).await.unwrap());
        }
        assert_eq!(service.list().await.unwrap().len(), 8);
    }

    /// Delegates to an in-memory log but parks inside `remove` until
    /// released, so a writer can be queued behind an in-flight delete on
    /// purpose.
    struct HeldRemoveLog {
        inner: InMemoryRevisionLog,
        remove_entered: tokio::sync::Semaphore,
        remove_release: tokio::sync::Semaphore,
    }

    impl HeldRemoveLog {
        fn new() -> Self {
            Self {
                inner: InMemoryRevisionLog::new(),
                remove_entered: tokio::sync::Semaphore::new(0),
                remove_release: tokio::sync::Semaphore::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl RevisionLog for HeldRemoveLog {
        async fn commit(
            &self,
            path: &ConfigPath,
            content: Bytes,
            comment: &str,
        ) -> vcfg_revlog::RevLogResult<ConfigId> {
            self.inner.commit(path, content, comment).await
        }

        async fn read(
            &self,
            path: &ConfigPath,
            id: ConfigId,
        ) -> vcfg_revlog::RevLogResult<Option<Bytes>> {
            self.inner.read(path, id).await
        }

        async fn read_at(
            &self,
            path: &ConfigPath,
            time: DateTime<Utc>,
        ) -> vcfg_revlog::RevLogResult<Option<(ConfigId, Bytes)>> {
            self.inner.read_at(path, time).await
        }

        async fn log(&self, path: &ConfigPath) -> vcfg_revlog::RevLogResult<Vec<HistoryEntry>> {
            self.inner.log(path).await
        }

        async fn remove(&self, path: &ConfigPath) -> vcfg_revlog::RevLogResult<()> {
            self.remove_entered.add_permits(1);
            self.remove_release
                .acquire()
                .await
                .expect("semaphore closed")
                .forget();
            self.inner.remove(path).await
        }

        async fn list(&self) -> vcfg_revlog::RevLogResult<Vec<ConfigPath>> {
            self.inner.list().await
        }

        async fn exists(&self, path: &ConfigPath) -> vcfg_revlog::RevLogResult<bool> {
            self.inner.exists(path).await
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn create_queued_behind_delete_serializes_with_later_create() {
        let log = Arc::new(HeldRemoveLog::new());
        let service = Arc::new(ConfigService::new(
            log.clone(),
            Arc::new(InMemoryAnnexStore::new()),
            Arc::new(InMemoryDefaultStore::new()),
            EngineSettings::default(),
        ));
        service
            .create("held.conf", "v0".into(), false, "initial")
            .await
            .unwrap();

        // Park a delete inside the log's `remove` while it holds the
        // path lock.
        let deleter = {
            let service = service.clone();
            tokio::spawn(async move { service.delete("held.conf").await })
        };
        log.remove_entered.acquire().await.unwrap().forget();

        // Queue a create behind the in-flight delete.
        let queued = {
            let service = service.clone();
            tokio::spawn(async move {
                service.create("held.conf", "queued".into(), false, "").await
            })
        };
        settle().await;

        // Let the delete finish, then issue a second create. Both creates
        // see the path inactive unless they share one lock, so exactly
        // one may win.
        log.remove_release.add_permits(1);
        deleter.await.unwrap().unwrap();
        let late = service.create("held.conf", "late".into(), false, "").await;
        let queued = queued.await.unwrap();

        assert!(
            queued.is_ok() ^ late.is_ok(),
            "exactly one create may succeed, got queued={queued:?} late={late:?}"
        );
        assert_eq!(service.history("held.conf").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn dangling_pointer_record_is_a_hard_error() {
        let log = Arc::new(InMemoryRevisionLog::new());
        let service = ConfigService::new(
            log.clone(),
            Arc::new(InMemoryAnnexStore::new()),
            Arc::new(InMemoryDefaultStore::new()),
            EngineSettings::default(),
        );

        // A pointer stream whose digest was never written to the annex:
        // the stores disagree, and the read must fail loudly rather than
        // pretend the path is missing.
        let pointer_path = ConfigPath::new("broken.conf.annex").unwrap();
        let record = PointerRecord::new(vcfg_annex::Digest::of(b"never stored"));
        log.commit(&pointer_path, record.encode(), "orphaned pointer")
            .await
            .unwrap();

        let err = service.get("broken.conf").await.unwrap_err();
        assert!(matches!(err, ConfigError::Annex(AnnexError::NotFound(_))));

        // The id-addressed and default reads go through the same
        // dereference.
        let entry = &service.history("broken.conf").await.unwrap()[0];
        let err = service.get_by_id("broken.conf", entry.id).await.unwrap_err();
        assert!(matches!(err, ConfigError::Annex(AnnexError::NotFound(_))));
    }
}
