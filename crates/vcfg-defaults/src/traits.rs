use vcfg_types::{ConfigId, ConfigPath};

use crate::error::DefaultResult;

/// Storage for per-path default-revision pins.
///
/// A pin is an optional revision id per path: absent means "default reads
/// track latest", present means "default reads are frozen to this
/// revision". Pins live entirely outside the revision log -- committing
/// new revisions never touches them.
///
/// This store holds raw pin state only. Checking that a pinned id actually
/// belongs to the path's history is the engine's job, done against the
/// revision log before `set` is ever called.
///
/// Implementations must be thread-safe (`Send + Sync`).
pub trait DefaultStore: Send + Sync {
    /// The pinned revision for a path, if any.
    fn get(&self, path: &ConfigPath) -> DefaultResult<Option<ConfigId>>;

    /// Pin a path to a revision. Unconditional overwrite.
    fn set(&self, path: &ConfigPath, id: ConfigId) -> DefaultResult<()>;

    /// Remove a pin. Idempotent: returns `Ok(false)` if the path was not
    /// pinned, `Ok(true)` if a pin was removed.
    fn reset(&self, path: &ConfigPath) -> DefaultResult<bool>;

    /// Drop all pin state for a path. Called when the path itself is
    /// deleted; equivalent to `reset` for this single-value store.
    fn delete(&self, path: &ConfigPath) -> DefaultResult<()>;
}
