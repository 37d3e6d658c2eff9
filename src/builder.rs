//! Builder for creating ImportCoordinator instances.
//!
//! The builder owns the registration phase: every stream is registered with
//! the engine in declaration order, the engine-assigned indices are recorded
//! (never assumed to match declaration order), registration is finalized
//! exactly once, and only then is the coordinator handed out. Ordering
//! violations are therefore unrepresentable through this API.

use std::collections::HashSet;

use tracing::debug;

use crate::config::{DecodePolicy, ImportManifest, StreamConfig, StreamSpec};
use crate::coordinator::{ImportCoordinator, StreamHandle};
use crate::engine::{EngineError, LoadEngine};
use crate::error::ImportError;
use crate::source::RecordSource;
use crate::wire::WireFormat;

/// Buffer capacity used when neither the stream nor the builder sets one.
pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug)]
pub struct MultifeedBuilder<R> {
    specs: Vec<StreamSpec<R>>,
    decode_policy: DecodePolicy,
    default_capacity: usize,
    default_format: WireFormat,
}

impl<R> MultifeedBuilder<R> {
    pub fn new() -> Self {
        Self {
            specs: Vec::new(),
            decode_policy: DecodePolicy::default(),
            default_capacity: DEFAULT_CAPACITY,
            default_format: WireFormat::default(),
        }
    }

    pub fn add_stream(
        mut self,
        name: impl Into<String>,
        source: impl RecordSource<Record = R> + 'static,
    ) -> Self {
        self.specs.push(StreamSpec::new(name, Box::new(source)));
        self
    }

    pub fn add_stream_spec(mut self, spec: StreamSpec<R>) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn with_decode_policy(mut self, policy: DecodePolicy) -> Self {
        self.decode_policy = policy;
        self
    }

    pub fn with_default_capacity(mut self, capacity: usize) -> Self {
        self.default_capacity = capacity;
        self
    }

    pub fn with_default_format(mut self, format: WireFormat) -> Self {
        self.default_format = format;
        self
    }

    /// Populate a builder from a manifest, using `open` to turn each
    /// declared stream into a record source.
    ///
    /// The hook point for callers that construct sources from paths, URLs,
    /// or anything else the manifest's `path` field encodes.
    pub fn from_manifest<F>(manifest: ImportManifest, mut open: F) -> Result<Self, ImportError>
    where
        F: FnMut(
            &StreamConfig,
        ) -> Result<
            Box<dyn RecordSource<Record = R>>,
            Box<dyn std::error::Error + Send + Sync>,
        >,
    {
        let mut builder = MultifeedBuilder::new();

        if let Some(policy_str) = manifest.decode_policy.as_deref() {
            let policy = DecodePolicy::from_str(policy_str).ok_or_else(|| {
                ImportError::Configuration {
                    stream: "<manifest>".to_string(),
                    reason: format!("unknown decode policy: {}", policy_str),
                }
            })?;
            builder = builder.with_decode_policy(policy);
        }

        if let Some(capacity) = manifest.default_capacity {
            builder = builder.with_default_capacity(capacity);
        }

        if let Some(format_str) = manifest.default_format.as_deref() {
            let format =
                format_str
                    .parse::<WireFormat>()
                    .map_err(|e| ImportError::Configuration {
                        stream: "<manifest>".to_string(),
                        reason: e.to_string(),
                    })?;
            builder = builder.with_default_format(format);
        }

        for cfg in &manifest.streams {
            let source = open(cfg).map_err(|e| ImportError::Configuration {
                stream: cfg.name.clone(),
                reason: e.to_string(),
            })?;
            let mut spec = StreamSpec::new(cfg.name.clone(), source);
            spec.capacity = cfg.capacity;
            if let Some(format_str) = cfg.format.as_deref() {
                let format =
                    format_str
                        .parse::<WireFormat>()
                        .map_err(|e| ImportError::Configuration {
                            stream: cfg.name.clone(),
                            reason: e.to_string(),
                        })?;
                spec.format = Some(format);
            }
            builder.specs.push(spec);
        }

        Ok(builder)
    }

    /// Register every declared stream with the engine, finalize
    /// registration, and return the coordinator.
    ///
    /// Fails fast: a duplicate name or rejected schema surfaces here, before
    /// any batch work begins.
    pub fn build<E>(self, mut engine: E) -> Result<ImportCoordinator<R, E>, ImportError>
    where
        E: LoadEngine<R>,
    {
        let mut seen = HashSet::with_capacity(self.specs.len());
        for spec in &self.specs {
            if !seen.insert(spec.name.as_str()) {
                return Err(ImportError::Configuration {
                    stream: spec.name.clone(),
                    reason: "duplicate stream name".to_string(),
                });
            }
        }

        let mut registered = Vec::with_capacity(self.specs.len());
        for spec in self.specs {
            let capacity = spec.capacity.unwrap_or(self.default_capacity);
            let format = spec.format.unwrap_or(self.default_format);
            let index = engine
                .register_stream(&spec.name, spec.source.schema(), capacity, format)
                .map_err(|e| registration_error(&spec.name, e))?;
            debug!(stream = %spec.name, %index, capacity, %format, "stream registered");
            registered.push((
                StreamHandle {
                    name: spec.name,
                    index,
                    capacity,
                    format,
                },
                spec.source,
            ));
        }

        engine
            .finalize_registration()
            .map_err(|e| match e {
                EngineError::OutOfSequence(what) => ImportError::Sequence(what.to_string()),
                other => ImportError::Engine(other),
            })?;

        Ok(ImportCoordinator::new(
            engine,
            registered,
            self.decode_policy,
        ))
    }
}

impl<R> Default for MultifeedBuilder<R> {
    fn default() -> Self {
        MultifeedBuilder::new()
    }
}

fn registration_error(stream: &str, e: EngineError) -> ImportError {
    match e {
        EngineError::DuplicateStream(name) => ImportError::Configuration {
            stream: name,
            reason: "duplicate stream name".to_string(),
        },
        EngineError::SchemaRejected(reason) => ImportError::Schema {
            stream: stream.to_string(),
            reason,
        },
        EngineError::OutOfSequence(what) => ImportError::Sequence(what.to_string()),
        other => ImportError::Engine(other),
    }
}
