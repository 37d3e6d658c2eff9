//! In-memory loading engine for testing.

use std::collections::VecDeque;

use super::{AddOutcome, EngineError, LoadEngine, StreamIndex};
use crate::source::Schema;
use crate::wire::WireFormat;

#[derive(Debug)]
struct StreamSlot<R> {
    name: String,
    capacity: usize,
    buffer: VecDeque<R>,
    /// Records arrived since the last batch.
    received: bool,
    /// Listed in the last batch's exhausted set.
    reported_exhausted: bool,
    /// Reported exhausted and then given no new data before the next batch:
    /// the engine deems the stream finished for good.
    ended: bool,
}

/// In-memory [`LoadEngine`] for tests and benchmarks.
///
/// Keeps one bounded buffer per stream and appends drained records to a
/// persisted log in batch order. Mirrors the externally observable contract
/// of a real bulk loader: `add` backpressures on a full buffer, each batch
/// reports which streams it drained dry, and the engine declares itself done
/// once every exhausted stream went a full round without new data.
#[derive(Debug)]
pub struct MemoryEngine<R> {
    slots: Vec<StreamSlot<R>>,
    finalized: bool,
    exhausted: Vec<StreamIndex>,
    persisted: Vec<(StreamIndex, R)>,
    batches: usize,
    drain_limit: Option<usize>,
    index_base: usize,
}

impl<R> MemoryEngine<R> {
    /// Create an engine that drains every buffer completely per batch.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            finalized: false,
            exhausted: Vec::new(),
            persisted: Vec::new(),
            batches: 0,
            drain_limit: None,
            index_base: 0,
        }
    }

    /// Limit how many records one batch consumes per stream, leaving the
    /// rest buffered. Exercises the not-yet-exhausted refill path.
    pub fn with_drain_limit(mut self, limit: usize) -> Self {
        self.drain_limit = Some(limit);
        self
    }

    /// Hand out stream indices starting at `base` instead of 0, so callers
    /// that wrongly equate index with registration order get caught.
    pub fn with_index_base(mut self, base: usize) -> Self {
        self.index_base = base;
        self
    }

    /// Records persisted so far, in batch consumption order.
    pub fn persisted(&self) -> &[(StreamIndex, R)] {
        &self.persisted
    }

    /// Records persisted for one stream, in delivery order.
    pub fn persisted_for(&self, stream: StreamIndex) -> Vec<&R> {
        self.persisted
            .iter()
            .filter(|(idx, _)| *idx == stream)
            .map(|(_, r)| r)
            .collect()
    }

    /// Number of `run_batch` calls so far.
    pub fn batches_run(&self) -> usize {
        self.batches
    }

    fn slot_mut(&mut self, stream: StreamIndex) -> Result<&mut StreamSlot<R>, EngineError> {
        let pos = stream
            .0
            .checked_sub(self.index_base)
            .filter(|&pos| pos < self.slots.len())
            .ok_or(EngineError::UnknownStream(stream))?;
        Ok(&mut self.slots[pos])
    }
}

impl<R> Default for MemoryEngine<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> LoadEngine<R> for MemoryEngine<R> {
    fn register_stream(
        &mut self,
        name: &str,
        schema: &Schema,
        capacity: usize,
        _format: WireFormat,
    ) -> Result<StreamIndex, EngineError> {
        if self.finalized {
            return Err(EngineError::OutOfSequence(
                "register_stream after finalize_registration",
            ));
        }
        if self.slots.iter().any(|s| s.name == name) {
            return Err(EngineError::DuplicateStream(name.to_string()));
        }
        if schema.fields.is_empty() {
            return Err(EngineError::SchemaRejected(
                "schema declares no fields".to_string(),
            ));
        }
        if capacity == 0 {
            return Err(EngineError::SchemaRejected(
                "capacity must be at least one record".to_string(),
            ));
        }
        let index = StreamIndex(self.index_base + self.slots.len());
        self.slots.push(StreamSlot {
            name: name.to_string(),
            capacity,
            buffer: VecDeque::with_capacity(capacity),
            received: false,
            reported_exhausted: false,
            ended: false,
        });
        Ok(index)
    }

    fn finalize_registration(&mut self) -> Result<(), EngineError> {
        if self.finalized {
            return Err(EngineError::OutOfSequence(
                "finalize_registration called twice",
            ));
        }
        self.finalized = true;
        Ok(())
    }

    fn add(&mut self, record: R, stream: StreamIndex) -> Result<AddOutcome<R>, EngineError> {
        if !self.finalized {
            return Err(EngineError::OutOfSequence(
                "add before finalize_registration",
            ));
        }
        let slot = self.slot_mut(stream)?;
        if slot.buffer.len() >= slot.capacity {
            return Ok(AddOutcome::Rejected(record));
        }
        slot.buffer.push_back(record);
        slot.received = true;
        Ok(AddOutcome::Accepted)
    }

    fn run_batch(&mut self) -> Result<(), EngineError> {
        if !self.finalized {
            return Err(EngineError::OutOfSequence(
                "run_batch before finalize_registration",
            ));
        }
        self.batches += 1;
        self.exhausted.clear();
        for (pos, slot) in self.slots.iter_mut().enumerate() {
            // A stream we asked for data and got none from has ended.
            if slot.reported_exhausted && !slot.received && slot.buffer.is_empty() {
                slot.ended = true;
            }
            let take = self
                .drain_limit
                .unwrap_or(usize::MAX)
                .min(slot.buffer.len());
            let index = StreamIndex(self.index_base + pos);
            for record in slot.buffer.drain(..take) {
                self.persisted.push((index, record));
            }
            slot.received = false;
            slot.reported_exhausted = !slot.ended && slot.buffer.is_empty();
            if slot.reported_exhausted {
                self.exhausted.push(index);
            }
        }
        Ok(())
    }

    fn is_done(&self) -> bool {
        self.finalized && self.slots.iter().all(|s| s.ended)
    }

    fn exhausted_stream_count(&self) -> usize {
        self.exhausted.len()
    }

    fn exhausted_stream_index(&self, i: usize) -> StreamIndex {
        self.exhausted[i]
    }
}
