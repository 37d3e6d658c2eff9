//! Wire format selection for registered streams.
//!
//! The loading engine expects each stream's records translated into one of a
//! small set of wire encodings. The encoding is negotiated once at
//! registration and never re-dispatched per record; the actual translation is
//! the engine's concern.

use std::str::FromStr;

/// Wire encoding the engine expects a stream's records translated into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WireFormat {
    /// Compact binary encoding
    #[default]
    Binary,
    /// Line-oriented text encoding
    Text,
    /// JSON encoding
    Json,
}

impl std::fmt::Display for WireFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WireFormat::Binary => write!(f, "binary"),
            WireFormat::Text => write!(f, "text"),
            WireFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for WireFormat {
    type Err = UnknownWireFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "binary" | "bin" => Ok(WireFormat::Binary),
            "text" | "txt" => Ok(WireFormat::Text),
            "json" => Ok(WireFormat::Json),
            _ => Err(UnknownWireFormat(s.to_string())),
        }
    }
}

/// Returned when a manifest names a wire format this crate does not know.
#[derive(Debug, thiserror::Error)]
#[error("unknown wire format: {0}")]
pub struct UnknownWireFormat(pub String);
