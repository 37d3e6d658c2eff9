//! Loading engine contract.
//!
//! This module provides:
//! - `LoadEngine`: Trait the coordinator feeds records into
//! - `StreamIndex`: Opaque engine-assigned stream identifier
//! - `AddOutcome`: Accepted / backpressured result of a single add
//! - `EngineError`: Failures surfaced by the engine
//! - `MemoryEngine`: In-memory engine for testing
//!
//! The real engine (its on-disk layout, partitioning, compression, and
//! durability) lives outside this crate; the coordinator only depends on
//! this trait.

use thiserror::Error;

use crate::source::Schema;
use crate::wire::WireFormat;

mod memory;
pub use memory::MemoryEngine;

/// Opaque stream identifier assigned by the engine at registration.
///
/// The coordinator records the mapping from stream name to index and uses it
/// exclusively thereafter; it never assumes the index equals registration
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamIndex(pub usize);

impl std::fmt::Display for StreamIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of offering one record to the engine.
#[derive(Debug, PartialEq, Eq)]
pub enum AddOutcome<R> {
    /// The engine buffered the record.
    Accepted,
    /// The stream's buffer is full; the record is handed back to be
    /// re-offered after the next batch. Backpressure, not an error.
    Rejected(R),
}

/// Failures surfaced by the loading engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A stream with this name is already registered
    #[error("duplicate stream name '{0}'")]
    DuplicateStream(String),

    /// The stream's header/schema is incompatible with the engine
    #[error("schema rejected: {0}")]
    SchemaRejected(String),

    /// An engine operation was called out of its required order
    #[error("call out of sequence: {0}")]
    OutOfSequence(&'static str),

    /// The engine never issued this stream index
    #[error("unknown stream index {0}")]
    UnknownStream(StreamIndex),

    /// Any other engine failure; fatal to the run
    #[error("engine failure: {0}")]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

/// Bulk-loading engine the coordinator feeds.
///
/// All methods take `&mut self`: the engine's batch operation acts on a
/// consistent snapshot of every stream buffer at once, so all calls are
/// serialized behind a single logical sequence point.
pub trait LoadEngine<R> {
    /// Register one stream before ingestion begins.
    ///
    /// Must be called for every source before [`finalize_registration`]
    /// (`LoadEngine::finalize_registration`). `capacity` is the maximum
    /// number of records the engine will buffer for this stream before
    /// backpressuring.
    fn register_stream(
        &mut self,
        name: &str,
        schema: &Schema,
        capacity: usize,
        format: WireFormat,
    ) -> Result<StreamIndex, EngineError>;

    /// Seal the registration table. Exactly once, after all
    /// [`register_stream`](LoadEngine::register_stream) calls and before any
    /// add or batch call.
    fn finalize_registration(&mut self) -> Result<(), EngineError>;

    /// Offer one record to a stream's buffer. Non-blocking;
    /// [`AddOutcome::Rejected`] means try again after the next batch.
    fn add(&mut self, record: R, stream: StreamIndex) -> Result<AddOutcome<R>, EngineError>;

    /// Consume and persist currently buffered records across all streams.
    /// May be a no-op if no stream had new data.
    fn run_batch(&mut self) -> Result<(), EngineError>;

    /// True only when the engine will accept no further input and has
    /// flushed everything.
    fn is_done(&self) -> bool;

    /// Number of streams the last batch left needing more input.
    ///
    /// Valid immediately after [`run_batch`](LoadEngine::run_batch), until
    /// the next one.
    fn exhausted_stream_count(&self) -> usize;

    /// The `i`-th exhausted stream index, `i < exhausted_stream_count()`.
    fn exhausted_stream_index(&self, i: usize) -> StreamIndex;
}
