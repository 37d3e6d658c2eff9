//! Iterator-backed record sources.

use std::collections::VecDeque;
use std::fmt;

use super::{DecodeError, RecordSource, Schema};

/// Adapter turning any fallible record iterator into a [`RecordSource`].
///
/// One item of lookahead is held so `has_next()` can answer without
/// consuming; a decode failure is only observed when the record is taken.
pub struct IterSource<R, I> {
    schema: Schema,
    iter: I,
    lookahead: Option<Result<R, DecodeError>>,
}

impl<R, I> IterSource<R, I>
where
    I: Iterator<Item = Result<R, DecodeError>>,
{
    /// Create a source over a fallible record iterator.
    pub fn new(schema: Schema, mut iter: I) -> Self {
        let lookahead = iter.next();
        Self {
            schema,
            iter,
            lookahead,
        }
    }
}

impl<R, I> fmt::Debug for IterSource<R, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterSource")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl<R, I> RecordSource for IterSource<R, I>
where
    I: Iterator<Item = Result<R, DecodeError>>,
{
    type Record = R;

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn has_next(&self) -> bool {
        self.lookahead.is_some()
    }

    fn next_record(&mut self) -> Result<R, DecodeError> {
        let item = self
            .lookahead
            .take()
            .unwrap_or_else(|| Err(DecodeError::message("source already drained")));
        self.lookahead = self.iter.next();
        item
    }
}

/// In-memory record source for testing.
#[derive(Debug, Clone)]
pub struct MemorySource<R> {
    schema: Schema,
    records: VecDeque<Result<R, String>>,
}

impl<R> MemorySource<R> {
    /// Create a source that yields the given records in order.
    pub fn new(schema: Schema, records: impl IntoIterator<Item = R>) -> Self {
        Self {
            schema,
            records: records.into_iter().map(Ok).collect(),
        }
    }

    /// Create a source from pre-built results, where `Err(msg)` positions
    /// yield a [`DecodeError`] when taken. Useful for malformed-record tests.
    pub fn from_results(
        schema: Schema,
        records: impl IntoIterator<Item = Result<R, String>>,
    ) -> Self {
        Self {
            schema,
            records: records.into_iter().collect(),
        }
    }
}

impl<R: fmt::Debug> RecordSource for MemorySource<R> {
    type Record = R;

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn has_next(&self) -> bool {
        !self.records.is_empty()
    }

    fn next_record(&mut self) -> Result<R, DecodeError> {
        match self.records.pop_front() {
            Some(Ok(record)) => Ok(record),
            Some(Err(msg)) => Err(DecodeError::message(msg)),
            None => Err(DecodeError::message("source already drained")),
        }
    }
}
