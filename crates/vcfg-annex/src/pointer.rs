//! The pointer record committed to the revision log in place of oversize
//! content.
//!
//! An annex-backed file's revision log stream never holds the real bytes;
//! each revision is a small fixed-format record carrying the digest under
//! which the payload lives in the annex store. The record is a single hex
//! line, so it is human-readable in raw log dumps and cheap to parse.

use bytes::Bytes;

use crate::digest::Digest;
use crate::error::AnnexError;

/// Stand-in payload committed for an annex-backed revision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointerRecord {
    digest: Digest,
}

impl PointerRecord {
    pub fn new(digest: Digest) -> Self {
        Self { digest }
    }

    /// The digest this record points at.
    pub fn digest(&self) -> Digest {
        self.digest
    }

    /// Encode to the committed wire form: one hex line.
    pub fn encode(&self) -> Bytes {
        Bytes::from(format!("{}\n", self.digest.to_hex()))
    }

    /// Decode committed bytes back into a record.
    ///
    /// Fails on anything that is not exactly one digest line; the engine
    /// relies on this to detect a corrupted pointer stream early instead
    /// of serving hex garbage as config content.
    pub fn decode(bytes: &[u8]) -> Result<Self, AnnexError> {
        let text = std::str::from_utf8(bytes).map_err(|_| AnnexError::MalformedPointer {
            reason: "pointer record is not UTF-8".into(),
        })?;
        let line = text.trim_end_matches(['\r', '\n']);
        if line.is_empty() || line.contains('\n') {
            return Err(AnnexError::MalformedPointer {
                reason: "pointer record must be a single digest line".into(),
            });
        }
        let digest = Digest::from_hex(line).map_err(|e| AnnexError::MalformedPointer {
            reason: e.to_string(),
        })?;
        Ok(Self { digest })
    }
}
