//! Lazy config content returned from reads and accepted by writes.
//!
//! Oversize payloads can be arbitrarily large, so "this content exists"
//! is kept separate from "this content is in memory": a [`ConfigData`] is
//! a finite, single-pass byte source, and materializing it is an explicit,
//! separately-awaited step.

use std::fmt;
use std::io::Cursor;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

enum Source {
    InMemory(Bytes),
    Stream(Box<dyn AsyncRead + Send + Unpin>),
}

/// A finite, single-pass byte sequence holding one revision's content.
pub struct ConfigData {
    source: Source,
}

impl ConfigData {
    /// Wrap already-materialized bytes.
    pub fn from_bytes(bytes: Bytes) -> Self {
        Self {
            source: Source::InMemory(bytes),
        }
    }

    /// Wrap a string payload.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self::from_bytes(Bytes::from(s.into()))
    }

    /// Wrap a lazy reader; nothing is read until materialization.
    pub fn from_reader(reader: Box<dyn AsyncRead + Send + Unpin>) -> Self {
        Self {
            source: Source::Stream(reader),
        }
    }

    /// Consume the data as a reader, for streaming consumers.
    pub fn into_reader(self) -> Box<dyn AsyncRead + Send + Unpin> {
        match self.source {
            Source::InMemory(bytes) => Box::new(Cursor::new(bytes)),
            Source::Stream(reader) => reader,
        }
    }

    /// Materialize the full content in memory.
    pub async fn into_bytes(self) -> std::io::Result<Bytes> {
        match self.source {
            Source::InMemory(bytes) => Ok(bytes),
            Source::Stream(mut reader) => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf).await?;
                Ok(Bytes::from(buf))
            }
        }
    }

    /// Materialize the full content as a UTF-8 string.
    pub async fn into_string(self) -> std::io::Result<String> {
        let bytes = self.into_bytes().await?;
        String::from_utf8(bytes.to_vec()).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e)
        })
    }
}

impl From<&str> for ConfigData {
    fn from(s: &str) -> Self {
        Self::from_string(s)
    }
}

impl fmt::Debug for ConfigData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Source::InMemory(bytes) => f
                .debug_struct("ConfigData")
                .field("kind", &"in-memory")
                .field("len", &bytes.len())
                .finish(),
            Source::Stream(_) => f
                .debug_struct("ConfigData")
                .field("kind", &"stream")
                .finish_non_exhaustive(),
        }
    }
}
