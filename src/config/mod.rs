//! Configuration types for stream declarations.
//!
//! This module provides:
//! - `StreamSpec`: Specification for a single source stream
//! - `DecodePolicy`: Policy for malformed source records
//! - `ImportManifest`: Declarative stream list loadable from JSON/YAML

mod manifest;
mod spec;

pub use manifest::{ImportManifest, StreamConfig};
pub use spec::{DecodePolicy, StreamSpec};
