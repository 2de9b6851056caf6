//! Config path normalization following slash-separated conventions.
//!
//! Valid config paths:
//! - Must be non-empty after stripping a single leading `/`
//! - Must not contain whitespace, control characters, or `\`
//! - Must not contain `..` components (parent traversal)
//! - Must not end with `/`
//! - Components between slashes must be non-empty

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Logical identifier for one configuration file's version history.
///
/// A `ConfigPath` is always normalized: `/a/b.conf` and `a/b.conf` name the
/// same logical entity and construct equal values. Ordering is lexicographic
/// on the normalized string, which is the order used by listings.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConfigPath {
    inner: String,
}

impl ConfigPath {
    /// Normalize and validate a raw path string.
    ///
    /// # Examples
    ///
    /// ```
    /// use vcfg_types::ConfigPath;
    ///
    /// let a = ConfigPath::new("/trombone.conf").unwrap();
    /// let b = ConfigPath::new("trombone.conf").unwrap();
    /// assert_eq!(a, b);
    /// assert!(ConfigPath::new("").is_err());
    /// assert!(ConfigPath::new("a/../b.conf").is_err());
    /// ```
    pub fn new(raw: &str) -> Result<Self, TypeError> {
        let normalized = raw.strip_prefix('/').unwrap_or(raw);

        if normalized.is_empty() {
            return Err(TypeError::InvalidPath {
                path: raw.to_string(),
                reason: "path must not be empty".into(),
            });
        }

        if let Some(ch) = normalized
            .chars()
            .find(|c| c.is_whitespace() || c.is_control() || *c == '\\')
        {
            return Err(TypeError::InvalidPath {
                path: raw.to_string(),
                reason: format!("contains forbidden character: {ch:?}"),
            });
        }

        if normalized.split('/').any(|component| component == "..") {
            return Err(TypeError::InvalidPath {
                path: raw.to_string(),
                reason: "must not contain '..'".into(),
            });
        }

        if normalized.ends_with('/') {
            return Err(TypeError::InvalidPath {
                path: raw.to_string(),
                reason: "must not end with '/'".into(),
            });
        }

        if normalized.split('/').any(str::is_empty) {
            return Err(TypeError::InvalidPath {
                path: raw.to_string(),
                reason: "must not contain empty components".into(),
            });
        }

        Ok(Self {
            inner: normalized.to_string(),
        })
    }

    /// The normalized path string.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Derive a sibling storage path by appending a suffix token.
    ///
    /// Used for the pointer-file convention: an annex-backed file at `p` has
    /// its pointer records committed under `p.with_suffix(suffix)`. The
    /// suffix is appended verbatim, so the result never collides with a
    /// same-named plain file.
    pub fn with_suffix(&self, suffix: &str) -> ConfigPath {
        ConfigPath {
            inner: format!("{}{}", self.inner, suffix),
        }
    }

    /// Returns `true` if this path ends with the given suffix token.
    pub fn has_suffix(&self, suffix: &str) -> bool {
        !suffix.is_empty() && self.inner.ends_with(suffix)
    }
}

impl TryFrom<String> for ConfigPath {
    type Error = TypeError;

    fn try_from(raw: String) -> Result<Self, TypeError> {
        ConfigPath::new(&raw)
    }
}

impl From<ConfigPath> for String {
    fn from(path: ConfigPath) -> String {
        path.inner
    }
}

impl fmt::Debug for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConfigPath({})", self.inner)
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}
