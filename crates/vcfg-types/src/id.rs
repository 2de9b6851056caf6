use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Backend-assigned identifier for one committed revision.
///
/// Ids are opaque to callers: the only guarantees are that they are
/// strictly increasing per path, assigned exactly once at commit time, and
/// never reused — even across a delete/recreate cycle of the same path.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConfigId(u64);

impl ConfigId {
    /// Wrap a raw backend id. Only revision log implementations should
    /// mint these; everyone else receives them from commit results.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl FromStr for ConfigId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, TypeError> {
        s.parse::<u64>()
            .map(ConfigId)
            .map_err(|_| TypeError::InvalidId(s.to_string()))
    }
}

impl fmt::Debug for ConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConfigId({})", self.0)
    }
}

impl fmt::Display for ConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
