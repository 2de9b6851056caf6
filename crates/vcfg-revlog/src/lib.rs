//! The revision log: VCFG's append-only durable backing store.
//!
//! Every write the config engine performs ends up as one commit in a
//! per-path stream here. The engine treats the log as a black box behind
//! the [`RevisionLog`] trait -- revision ids, commit timestamps, commit
//! comments, and byte-content-at-revision are the whole interface. Any
//! ordered, durable, per-key commit log can sit behind it: a write-ahead
//! log plus an index, an actual source-control system, or the bundled
//! [`InMemoryRevisionLog`].

pub mod error;
pub mod memory;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{RevLogError, RevLogResult};
pub use memory::InMemoryRevisionLog;
pub use traits::RevisionLog;
