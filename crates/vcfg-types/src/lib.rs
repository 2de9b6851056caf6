//! Foundation types for VCFG, the versioned configuration store.
//!
//! Everything here is a plain value type shared across the workspace:
//!
//! - [`ConfigPath`] — normalized logical identifier for one config file
//! - [`ConfigId`] — backend-assigned revision identifier
//! - [`HistoryEntry`] / [`ConfigFileInfo`] — read-only history projections
//!
//! # Design Rules
//!
//! 1. Paths are validated on construction; no other crate re-validates.
//! 2. Revision ids are opaque and never minted outside a revision log.
//! 3. All value types are serde-serializable for transport layers.

pub mod error;
pub mod id;
pub mod info;
pub mod path;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{TypeError, TypeResult};
pub use id::ConfigId;
pub use info::{ConfigFileInfo, HistoryEntry};
pub use path::ConfigPath;
