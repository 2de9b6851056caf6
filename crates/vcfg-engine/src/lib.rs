//! The VCFG config engine.
//!
//! [`ConfigService`] is the client-facing surface of the versioned
//! configuration store: create, update, get (latest / by revision / as-of
//! a time), default-pin management, exists, delete, history, and listing.
//! It composes three pluggable backends:
//!
//! - a [`RevisionLog`](vcfg_revlog::RevisionLog) holding each path's
//!   append-only revision stream,
//! - an [`AnnexStore`](vcfg_annex::AnnexStore) holding oversize payloads
//!   under content digests, and
//! - a [`DefaultStore`](vcfg_defaults::DefaultStore) holding per-path
//!   default-revision pins.
//!
//! Oversize files are stored structurally: their revision stream lives
//! under a suffixed pointer path and carries
//! [`PointerRecord`](vcfg_annex::PointerRecord)s instead of content. The
//! engine branches on which stream exists, so the flag given at create
//! time is sticky and never persisted anywhere else.
//!
//! Reads hand back [`ConfigData`], a lazy single-pass byte source;
//! materializing it in memory is an explicit second step.

pub mod data;
pub mod error;
pub mod service;
pub mod settings;

// Re-export primary types at crate root for ergonomic imports.
pub use data::ConfigData;
pub use error::{ConfigError, ConfigResult};
pub use service::ConfigService;
pub use settings::EngineSettings;

// The engine's value-type vocabulary, re-exported for callers that only
// depend on this crate.
pub use vcfg_types::{ConfigFileInfo, ConfigId, ConfigPath, HistoryEntry};
