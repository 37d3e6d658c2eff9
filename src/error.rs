//! Error taxonomy for multifeed imports.
//!
//! This module provides:
//! - `ImportError`: Everything a registration or import run can fail with
//! - Re-exported leaf errors live next to their contracts:
//!   `EngineError` in `engine`, `DecodeError` in `source`

use thiserror::Error;

use crate::engine::EngineError;
use crate::source::DecodeError;

/// Errors surfaced by stream registration and the import run.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Bad or duplicate stream registration, detected before any batch work
    #[error("configuration error for stream '{stream}': {reason}")]
    Configuration { stream: String, reason: String },

    /// The engine rejected a stream's header/schema at registration
    #[error("schema rejected for stream '{stream}': {reason}")]
    Schema { stream: String, reason: String },

    /// An operation was invoked out of its required order
    #[error("operation out of sequence: {0}")]
    Sequence(String),

    /// A source record failed to decode
    #[error("failed to decode record {ordinal} of stream '{stream}': {source}")]
    Decode {
        stream: String,
        ordinal: u64,
        source: DecodeError,
    },

    /// The loading engine failed during add or batch consumption.
    /// Always fatal to the whole run.
    #[error("loading engine failure: {0}")]
    Engine(#[from] EngineError),
}

impl ImportError {
    /// Name of the offending stream, where the error is attributable to one.
    pub fn stream(&self) -> Option<&str> {
        match self {
            ImportError::Configuration { stream, .. }
            | ImportError::Schema { stream, .. }
            | ImportError::Decode { stream, .. } => Some(stream),
            ImportError::Sequence(_) | ImportError::Engine(_) => None,
        }
    }
}
