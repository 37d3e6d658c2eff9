//! Record source abstraction.
//!
//! This module provides:
//! - `RecordSource`: Trait for lazy, finite, non-restartable record producers
//! - `Schema`: Per-stream header info read once at registration
//! - `DecodeError`: Failure to decode one source record
//!
//! Parsing of the underlying format is out of scope; implementors wrap a
//! reader/decoder with a next()-style interface.

use std::fmt::Debug;

mod iter;
pub use iter::{IterSource, MemorySource};

/// Per-stream header information, read once when the source is constructed
/// and handed to the engine at registration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    /// Ordered field names of each record
    pub fields: Vec<String>,
}

impl Schema {
    /// Create a schema from field names.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

/// A single source record failed to decode.
///
/// Whether this aborts the run or skips the record is decided by the
/// configured [`DecodePolicy`](crate::config::DecodePolicy).
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct DecodeError {
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl DecodeError {
    /// Wrap an underlying decoder error.
    pub fn new(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    /// Create a decode error from a plain message.
    pub fn message(msg: impl Into<String>) -> Self {
        Self {
            source: msg.into().into(),
        }
    }
}

/// Trait for lazy, finite, non-restartable record producers.
///
/// One implementor per stream. The coordinator only ever reads a record when
/// it has no record pending delivery for that stream, so at most one record
/// is held in flight between source and engine.
pub trait RecordSource: Debug {
    /// The decoded record type this source yields.
    type Record;

    /// Header/schema info, read once and passed to stream registration.
    fn schema(&self) -> &Schema;

    /// Whether another record can be read.
    fn has_next(&self) -> bool;

    /// Take the next record.
    ///
    /// Must only be called while `has_next()` is true.
    fn next_record(&mut self) -> Result<Self::Record, DecodeError>;
}
