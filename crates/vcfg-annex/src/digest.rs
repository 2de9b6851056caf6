use std::fmt;

use crate::error::AnnexError;

/// Content fingerprint used as the annex store's key.
///
/// A `Digest` is the BLAKE3 hash of a blob's bytes. Identical content
/// always produces the identical digest, which is what makes the annex
/// store naturally deduplicating.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest {
    hash: [u8; 32],
}

impl Digest {
    /// Compute the digest of a complete in-memory buffer.
    pub fn of(data: &[u8]) -> Self {
        Self {
            hash: *blake3::hash(data).as_bytes(),
        }
    }

    /// Incremental digest computation for streamed content.
    pub fn hasher() -> DigestHasher {
        DigestHasher {
            inner: blake3::Hasher::new(),
        }
    }

    /// The raw 32-byte hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.hash
    }

    /// Full hex-encoded string (64 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Parse from a hex string (64 hex characters).
    pub fn from_hex(s: &str) -> Result<Self, AnnexError> {
        let bytes = hex::decode(s).map_err(|e| AnnexError::InvalidDigest {
            digest: s.to_string(),
            reason: e.to_string(),
        })?;
        if bytes.len() != 32 {
            return Err(AnnexError::InvalidDigest {
                digest: s.to_string(),
                reason: format!("expected 32 bytes, got {}", bytes.len()),
            });
        }
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes);
        Ok(Self { hash })
    }
}

/// Streaming wrapper around the BLAKE3 hasher.
pub struct DigestHasher {
    inner: blake3::Hasher,
}

impl DigestHasher {
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    pub fn finalize(self) -> Digest {
        Digest {
            hash: *self.inner.finalize().as_bytes(),
        }
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", &self.to_hex()[..8])
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
