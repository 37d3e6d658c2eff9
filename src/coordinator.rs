//! The buffer-stream import coordinator.
//!
//! Drives the feed/batch/refill cycle: records are pushed into the engine's
//! per-stream buffers until each selected stream either runs dry or
//! backpressures, one batch is consumed, and the engine's post-batch
//! exhaustion report selects the streams to refill. The cycle repeats until
//! the engine declares global completion.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::DecodePolicy;
use crate::engine::{AddOutcome, LoadEngine, StreamIndex};
use crate::error::ImportError;
use crate::source::RecordSource;
use crate::wire::WireFormat;

/// One registered stream: caller-assigned name plus the capacity and format
/// negotiated with the engine. Immutable once registration is finalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHandle {
    /// Unique caller-assigned name
    pub name: String,
    /// Engine-assigned index, used for all subsequent engine calls
    pub index: StreamIndex,
    /// Records the engine buffers for this stream before backpressuring
    pub capacity: usize,
    /// Wire encoding resolved at registration
    pub format: WireFormat,
}

/// Per-stream cursor state owned by the coordinator.
///
/// `pending` holds the one record read from the source but not yet accepted
/// by the engine. No record is read while `pending` is occupied, so at most
/// one record per stream is in flight and a backpressured record is re-offered
/// rather than dropped or re-read.
struct StreamState<R> {
    handle: StreamHandle,
    source: Box<dyn RecordSource<Record = R>>,
    pending: Option<R>,
    /// Records read from the source, including ones that failed to decode
    read: u64,
    /// Records the engine accepted
    delivered: u64,
}

/// A malformed record that was skipped under [`DecodePolicy::Skip`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeIncident {
    /// Stream the record came from
    pub stream: String,
    /// 1-based position of the record in its source
    pub ordinal: u64,
    /// Rendered decode error
    pub error: String,
}

/// Per-stream totals for a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamReport {
    pub name: String,
    pub index: StreamIndex,
    /// Records read from the source
    pub read: u64,
    /// Records the engine accepted
    pub delivered: u64,
}

/// Summary of a completed import run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// Number of batches the engine consumed
    pub batches: usize,
    /// Per-stream totals, in registration order
    pub streams: Vec<StreamReport>,
    /// Records skipped under [`DecodePolicy::Skip`]
    pub skipped: Vec<DecodeIncident>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Init,
    Feeding,
    Batching,
    RefillSelect,
    Done,
}

/// Coordinates multiplexed, backpressure-aware ingestion into a
/// [`LoadEngine`].
///
/// Built by [`MultifeedBuilder`](crate::MultifeedBuilder), which registers
/// every stream and finalizes registration before this type ever feeds a
/// record. Single-threaded cooperative: streams are fed sequentially, and a
/// record is always fully read and fully offered before the next stream is
/// touched.
pub struct ImportCoordinator<R, E> {
    engine: E,
    streams: Vec<StreamState<R>>,
    /// Engine index -> slot in `streams`
    by_index: HashMap<StreamIndex, usize>,
    /// Registration table: name -> engine index, built once
    by_name: HashMap<String, StreamIndex>,
    decode_policy: DecodePolicy,
    skipped: Vec<DecodeIncident>,
    batches: usize,
    phase: Phase,
}

impl<R, E: LoadEngine<R>> ImportCoordinator<R, E> {
    pub(crate) fn new(
        engine: E,
        registered: Vec<(StreamHandle, Box<dyn RecordSource<Record = R>>)>,
        decode_policy: DecodePolicy,
    ) -> Self {
        let mut streams = Vec::with_capacity(registered.len());
        let mut by_index = HashMap::with_capacity(registered.len());
        let mut by_name = HashMap::with_capacity(registered.len());
        for (slot, (handle, source)) in registered.into_iter().enumerate() {
            by_index.insert(handle.index, slot);
            by_name.insert(handle.name.clone(), handle.index);
            streams.push(StreamState {
                handle,
                source,
                pending: None,
                read: 0,
                delivered: 0,
            });
        }
        Self {
            engine,
            streams,
            by_index,
            by_name,
            decode_policy,
            skipped: Vec::new(),
            batches: 0,
            phase: Phase::Init,
        }
    }

    /// Registered stream handles, in registration order.
    pub fn handles(&self) -> impl Iterator<Item = &StreamHandle> {
        self.streams.iter().map(|s| &s.handle)
    }

    /// Engine index for a registered stream name.
    pub fn index_of(&self, name: &str) -> Option<StreamIndex> {
        self.by_name.get(name).copied()
    }

    /// The underlying engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Consume the coordinator and return the engine.
    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Drive the import to completion.
    ///
    /// Feeds every stream once, then loops batch/refill rounds until the
    /// engine reports it is done. Completion is never inferred from the
    /// sources running dry: the engine may still be draining buffered
    /// records. Any engine error is fatal and aborts the run immediately,
    /// with no claim about which streams were flushed.
    pub fn run(&mut self) -> Result<ImportReport, ImportError> {
        if self.phase != Phase::Init {
            return Err(ImportError::Sequence(
                "run may only be called once per coordinator".to_string(),
            ));
        }
        // Every stream starts exhausted from the coordinator's point of
        // view: nothing has been fed yet.
        let mut selected: Vec<usize> = (0..self.streams.len()).collect();
        self.phase = Phase::Feeding;
        loop {
            self.phase = match self.phase {
                Phase::Feeding => {
                    for &slot in &selected {
                        Self::feed_stream(
                            &mut self.engine,
                            &mut self.streams[slot],
                            self.decode_policy,
                            &mut self.skipped,
                        )?;
                    }
                    Phase::Batching
                }
                Phase::Batching => {
                    // Unconditional: even if every selected stream fed zero
                    // records this round, others may still hold data.
                    self.engine.run_batch()?;
                    self.batches += 1;
                    debug!(batch = self.batches, "batch consumed");
                    Phase::RefillSelect
                }
                Phase::RefillSelect => {
                    if self.engine.is_done() {
                        Phase::Done
                    } else {
                        selected = self.select_exhausted()?;
                        debug!(refill = selected.len(), "exhausted streams selected");
                        Phase::Feeding
                    }
                }
                Phase::Init | Phase::Done => break,
            };
        }
        Ok(self.report())
    }

    /// Map the engine's post-batch exhaustion report to stream slots.
    ///
    /// Recomputed fresh after every batch; streams the engine does not list
    /// are still backpressured and left alone.
    fn select_exhausted(&self) -> Result<Vec<usize>, ImportError> {
        let count = self.engine.exhausted_stream_count();
        let mut slots = Vec::with_capacity(count);
        for i in 0..count {
            let index = self.engine.exhausted_stream_index(i);
            let slot = self
                .by_index
                .get(&index)
                .copied()
                .ok_or(crate::engine::EngineError::UnknownStream(index))?;
            slots.push(slot);
        }
        Ok(slots)
    }

    /// Feed one stream until its source runs dry or the engine
    /// backpressures.
    fn feed_stream(
        engine: &mut E,
        state: &mut StreamState<R>,
        decode_policy: DecodePolicy,
        skipped: &mut Vec<DecodeIncident>,
    ) -> Result<(), ImportError> {
        loop {
            match state.pending.take() {
                Some(record) => match engine.add(record, state.handle.index)? {
                    AddOutcome::Accepted => {
                        state.delivered += 1;
                    }
                    AddOutcome::Rejected(record) => {
                        // Buffer full: park the record for the next round.
                        state.pending = Some(record);
                        return Ok(());
                    }
                },
                None => {
                    if !state.source.has_next() {
                        // Drained for good.
                        return Ok(());
                    }
                    state.read += 1;
                    match state.source.next_record() {
                        Ok(record) => state.pending = Some(record),
                        Err(err) => match decode_policy {
                            DecodePolicy::Abort => {
                                return Err(ImportError::Decode {
                                    stream: state.handle.name.clone(),
                                    ordinal: state.read,
                                    source: err,
                                });
                            }
                            DecodePolicy::Skip => {
                                warn!(
                                    stream = %state.handle.name,
                                    ordinal = state.read,
                                    error = %err,
                                    "skipping malformed record"
                                );
                                skipped.push(DecodeIncident {
                                    stream: state.handle.name.clone(),
                                    ordinal: state.read,
                                    error: err.to_string(),
                                });
                            }
                        },
                    }
                }
            }
        }
    }

    fn report(&self) -> ImportReport {
        ImportReport {
            batches: self.batches,
            streams: self
                .streams
                .iter()
                .map(|s| StreamReport {
                    name: s.handle.name.clone(),
                    index: s.handle.index,
                    read: s.read,
                    delivered: s.delivered,
                })
                .collect(),
            skipped: self.skipped.clone(),
        }
    }
}

impl<R, E: std::fmt::Debug> std::fmt::Debug for ImportCoordinator<R, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportCoordinator")
            .field("engine", &self.engine)
            .field("streams", &self.streams.len())
            .field("decode_policy", &self.decode_policy)
            .field("batches", &self.batches)
            .field("phase", &self.phase)
            .finish()
    }
}
