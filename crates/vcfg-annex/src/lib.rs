//! Content-addressed annex storage for oversize VCFG payloads.
//!
//! Oversize config files never have their real bytes committed to the
//! revision log. Instead the payload is written here, keyed by its BLAKE3
//! digest, and a small [`PointerRecord`] carrying that digest is committed
//! in its place. Because the key is derived from content, the store
//! deduplicates byte-identical revisions across all paths for free.
//!
//! # Storage Backends
//!
//! All backends implement the [`AnnexStore`] trait:
//!
//! - [`InMemoryAnnexStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsAnnexStore`] -- fan-out object directory with atomic temp-file
//!   writes
//!
//! # Design Rules
//!
//! 1. Blobs are immutable once written (content-addressing guarantees this).
//! 2. `put` hashes while streaming; payloads are never buffered whole by the
//!    filesystem backend.
//! 3. Racing identical writes collapse to one stored blob.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod digest;
pub mod error;
pub mod fs;
pub mod memory;
pub mod pointer;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use digest::{Digest, DigestHasher};
pub use error::{AnnexError, AnnexResult};
pub use fs::FsAnnexStore;
pub use memory::InMemoryAnnexStore;
pub use pointer::PointerRecord;
pub use traits::{AnnexReader, AnnexStore};
