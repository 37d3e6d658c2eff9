//! Per-stream specifications and decode policy.

use std::fmt;

use crate::source::RecordSource;
use crate::wire::WireFormat;

/// Policy for records the source fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// Abort the whole run on the first malformed record
    #[default]
    Abort,
    /// Record the incident and continue with the next record
    Skip,
}

impl DecodePolicy {
    /// Parse a policy from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "abort" | "abort_all" => Some(DecodePolicy::Abort),
            "skip" | "skip_and_log" => Some(DecodePolicy::Skip),
            _ => None,
        }
    }
}

/// Specification for a single source stream.
///
/// `capacity` and `format` fall back to the builder's defaults when unset.
pub struct StreamSpec<R> {
    /// Unique caller-assigned stream name
    pub name: String,
    /// The record source implementation
    pub source: Box<dyn RecordSource<Record = R>>,
    /// Records the engine may buffer before backpressuring
    pub capacity: Option<usize>,
    /// Wire encoding the engine translates records into
    pub format: Option<WireFormat>,
}

impl<R> StreamSpec<R> {
    /// Create a new stream specification.
    pub fn new(name: impl Into<String>, source: Box<dyn RecordSource<Record = R>>) -> Self {
        Self {
            name: name.into(),
            source,
            capacity: None,
            format: None,
        }
    }

    /// Set the per-stream buffer capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Set the wire format.
    pub fn with_format(mut self, format: WireFormat) -> Self {
        self.format = Some(format);
        self
    }
}

impl<R> fmt::Debug for StreamSpec<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSpec")
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}
