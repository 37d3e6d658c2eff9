//! # multifeed
//!
//! A multiplexed, backpressure-aware batch ingestion coordinator for
//! bulk-loading engines.
//!
//! ## Overview
//!
//! multifeed feeds records from many independent source streams into a
//! single bulk-loading engine, in discrete batches:
//!
//! - **Multi-stream feeding**: Each stream produces records at its own pace
//!   into a per-stream bounded buffer inside the engine
//! - **Backpressure**: A full buffer rejects the record; the coordinator
//!   parks it and re-offers the same record after the next batch, never
//!   skipping or duplicating it
//! - **Batch/refill cycle**: After every batch the engine reports exactly
//!   which streams it drained dry; only those are refilled
//! - **Engine-driven completion**: The run ends when the engine says so,
//!   never when the sources happen to run dry
//! - **Decode policies**: Abort the run on the first malformed record, or
//!   skip and report (`Abort` is the default)
//! - **Manifest configuration**: Declare streams via JSON/YAML manifests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use multifeed::{MemoryEngine, MultifeedBuilder, MemorySource, Schema};
//!
//! fn main() -> Result<(), multifeed::ImportError> {
//!     let schema = Schema::new(["pos", "alt"]);
//!     let mut coordinator = MultifeedBuilder::new()
//!         .add_stream("a", MemorySource::new(schema.clone(), ["r1", "r2"]))
//!         .add_stream("b", MemorySource::new(schema, ["s1"]))
//!         .build(MemoryEngine::new())?;
//!
//!     let report = coordinator.run()?;
//!     assert_eq!(report.streams[0].delivered, 2);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `json` - JSON manifest support (enabled by default)
//! - `yaml` - YAML manifest support
//!
//! ## What this crate does not do
//!
//! Source-format parsing, the storage engine's on-disk layout, CLI argument
//! handling, and record-to-wire serialization are external collaborators
//! behind the [`RecordSource`] and [`LoadEngine`] traits.

// Core modules
pub mod builder;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod source;
pub mod wire;

// Re-exports for convenience
pub use builder::{DEFAULT_CAPACITY, MultifeedBuilder};
pub use config::{DecodePolicy, ImportManifest, StreamConfig, StreamSpec};
pub use coordinator::{
    DecodeIncident, ImportCoordinator, ImportReport, StreamHandle, StreamReport,
};
pub use engine::{AddOutcome, EngineError, LoadEngine, MemoryEngine, StreamIndex};
pub use error::ImportError;
pub use source::{DecodeError, IterSource, MemorySource, RecordSource, Schema};
pub use wire::WireFormat;

/// Build an ImportCoordinator from an ImportManifest, using `open` to turn
/// each declared stream into a record source.
pub fn build_coordinator_from_manifest<R, E, F>(
    manifest: ImportManifest,
    engine: E,
    open: F,
) -> Result<ImportCoordinator<R, E>, ImportError>
where
    E: LoadEngine<R>,
    F: FnMut(
        &StreamConfig,
    ) -> Result<Box<dyn RecordSource<Record = R>>, Box<dyn std::error::Error + Send + Sync>>,
{
    MultifeedBuilder::from_manifest(manifest, open)?.build(engine)
}
