//! Declarative import manifest.
//!
//! Generalizes the stream-name-to-file mapping that traditionally drives
//! bulk imports: the manifest declares stream names, source locations, and
//! per-stream overrides, while the caller supplies the code that opens each
//! declared source.

use serde::Deserialize;

/// Configuration for an entire import: one entry per stream.
///
/// Declaration order is preserved and becomes registration order.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ImportManifest {
    /// Stream declarations
    #[serde(default)]
    pub streams: Vec<StreamConfig>,
    /// Decode policy: "abort" or "skip"
    #[serde(default)]
    pub decode_policy: Option<String>,
    /// Buffer capacity for streams that do not set their own
    #[serde(default)]
    pub default_capacity: Option<usize>,
    /// Wire format for streams that do not set their own
    #[serde(default)]
    pub default_format: Option<String>,
}

/// Configuration for a single declared stream.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    /// Unique stream name
    pub name: String,
    /// Source location (file path, URL, ...); interpreted by the caller's
    /// source-opening hook
    #[serde(default)]
    pub path: Option<String>,
    /// Per-stream buffer capacity override
    #[serde(default)]
    pub capacity: Option<usize>,
    /// Per-stream wire format override: "binary", "text", "json"
    #[serde(default)]
    pub format: Option<String>,
}

impl ImportManifest {
    /// Create a new empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stream declaration.
    pub fn add_stream(mut self, stream: StreamConfig) -> Self {
        self.streams.push(stream);
        self
    }

    /// Set the decode policy.
    pub fn with_decode_policy(mut self, policy: impl Into<String>) -> Self {
        self.decode_policy = Some(policy.into());
        self
    }

    /// Set the default buffer capacity.
    pub fn with_default_capacity(mut self, capacity: usize) -> Self {
        self.default_capacity = Some(capacity);
        self
    }

    /// Parse a manifest from JSON.
    #[cfg(feature = "json")]
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Parse a manifest from a JSON reader.
    #[cfg(feature = "json")]
    pub fn from_json_reader(reader: impl std::io::Read) -> Result<Self, serde_json::Error> {
        serde_json::from_reader(reader)
    }

    /// Parse a manifest from YAML.
    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(s: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(s)
    }
}
