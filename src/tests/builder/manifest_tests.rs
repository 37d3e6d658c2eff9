//! Manifest-driven construction tests.

use crate::config::ImportManifest;
use crate::engine::MemoryEngine;
use crate::source::{MemorySource, RecordSource, Schema};
use crate::wire::WireFormat;
use crate::{build_coordinator_from_manifest, ImportError, MultifeedBuilder};

fn open_with_three_records(
    cfg: &crate::config::StreamConfig,
) -> Result<Box<dyn RecordSource<Record = String>>, Box<dyn std::error::Error + Send + Sync>> {
    let records = (0..3).map(|i| format!("{}-{}", cfg.name, i));
    Ok(Box::new(MemorySource::new(Schema::new(["f"]), records)))
}

#[test]
fn manifest_declarations_become_registered_streams() {
    let manifest = ImportManifest::from_json_str(
        r#"{
            "streams": [
                {"name": "alpha"},
                {"name": "beta", "capacity": 3, "format": "json"}
            ],
            "default_capacity": 16,
            "decode_policy": "skip"
        }"#,
    )
    .expect("manifest should parse");

    let mut coordinator =
        build_coordinator_from_manifest(manifest, MemoryEngine::new(), open_with_three_records)
            .expect("build should succeed");

    let handles: Vec<_> = coordinator.handles().cloned().collect();
    assert_eq!(handles.len(), 2);
    assert_eq!(handles[0].name, "alpha");
    assert_eq!(handles[0].capacity, 16);
    assert_eq!(handles[0].format, WireFormat::Binary);
    assert_eq!(handles[1].capacity, 3);
    assert_eq!(handles[1].format, WireFormat::Json);

    let report = coordinator.run().expect("run should succeed");
    assert_eq!(report.streams.iter().map(|s| s.delivered).sum::<u64>(), 6);
}

#[test]
fn unknown_decode_policy_is_a_configuration_error() {
    let manifest = ImportManifest::new().with_decode_policy("retry-forever");
    let err = MultifeedBuilder::<String>::from_manifest(manifest, open_with_three_records)
        .expect_err("unknown policy must fail");
    assert!(matches!(err, ImportError::Configuration { .. }));
}

#[test]
fn unknown_wire_format_is_a_configuration_error() {
    let manifest = ImportManifest::from_json_str(
        r#"{"streams": [{"name": "s", "format": "protobuf"}]}"#,
    )
    .expect("manifest should parse");
    let err = MultifeedBuilder::<String>::from_manifest(manifest, open_with_three_records)
        .expect_err("unknown format must fail");
    match err {
        ImportError::Configuration { stream, reason } => {
            assert_eq!(stream, "s");
            assert!(reason.contains("protobuf"));
        }
        other => panic!("expected Configuration error, got {other:?}"),
    }
}

#[test]
fn failing_source_open_names_the_stream() {
    let manifest =
        ImportManifest::from_json_str(r#"{"streams": [{"name": "ghost", "path": "/missing"}]}"#)
            .expect("manifest should parse");

    let err = MultifeedBuilder::<String>::from_manifest(manifest, |cfg| {
        Err(format!("cannot open {}", cfg.path.as_deref().unwrap_or("?")).into())
    })
    .expect_err("open failure must fail");

    match err {
        ImportError::Configuration { stream, reason } => {
            assert_eq!(stream, "ghost");
            assert!(reason.contains("/missing"));
        }
        other => panic!("expected Configuration error, got {other:?}"),
    }
}
