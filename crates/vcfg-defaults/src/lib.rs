//! Default-revision pins for VCFG paths.
//!
//! Each config path may carry at most one pin freezing "default" reads to
//! a specific revision. Pin state is deliberately independent of the
//! revision log: write traffic never moves a pin, and only explicit
//! set/reset calls mutate it.

pub mod error;
pub mod memory;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{DefaultError, DefaultResult};
pub use memory::InMemoryDefaultStore;
pub use traits::DefaultStore;
