//! Read-only projections derived from a path's revision history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::ConfigId;
use crate::path::ConfigPath;

/// Metadata for one committed revision of a path.
///
/// History listings are newest-first sequences of these.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Backend-assigned revision id.
    pub id: ConfigId,
    /// Commit comment supplied by the writer.
    pub comment: String,
    /// Commit timestamp assigned by the backend.
    pub time: DateTime<Utc>,
}

/// One row of a file listing: a path together with its latest revision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFileInfo {
    /// Stored path (for annex-backed files this is the suffixed pointer
    /// path, which is what the backing log actually tracks).
    pub path: ConfigPath,
    /// Latest revision id.
    pub id: ConfigId,
    /// Comment of the latest revision.
    pub comment: String,
}

impl ConfigFileInfo {
    pub fn new(path: ConfigPath, id: ConfigId, comment: impl Into<String>) -> Self {
        Self {
            path,
            id,
            comment: comment.into(),
        }
    }
}
