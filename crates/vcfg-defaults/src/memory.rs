use std::collections::HashMap;
use std::sync::RwLock;

use vcfg_types::{ConfigId, ConfigPath};

use crate::error::DefaultResult;
use crate::traits::DefaultStore;

/// In-memory, HashMap-based pin store.
pub struct InMemoryDefaultStore {
    pins: RwLock<HashMap<ConfigPath, ConfigId>>,
}

impl InMemoryDefaultStore {
    /// Create a new empty pin store.
    pub fn new() -> Self {
        Self {
            pins: RwLock::new(HashMap::new()),
        }
    }

    /// Number of currently pinned paths.
    pub fn len(&self) -> usize {
        self.pins.read().expect("lock poisoned").len()
    }

    /// Returns `true` if no path is pinned.
    pub fn is_empty(&self) -> bool {
        self.pins.read().expect("lock poisoned").is_empty()
    }
}

impl Default for InMemoryDefaultStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultStore for InMemoryDefaultStore {
    fn get(&self, path: &ConfigPath) -> DefaultResult<Option<ConfigId>> {
        Ok(self.pins.read().expect("lock poisoned").get(path).copied())
    }

    fn set(&self, path: &ConfigPath, id: ConfigId) -> DefaultResult<()> {
        self.pins
            .write()
            .expect("lock poisoned")
            .insert(path.clone(), id);
        Ok(())
    }

    fn reset(&self, path: &ConfigPath) -> DefaultResult<bool> {
        Ok(self
            .pins
            .write()
            .expect("lock poisoned")
            .remove(path)
            .is_some())
    }

    fn delete(&self, path: &ConfigPath) -> DefaultResult<()> {
        self.pins.write().expect("lock poisoned").remove(path);
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryDefaultStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDefaultStore")
            .field("pin_count", &self.len())
            .finish()
    }
}
