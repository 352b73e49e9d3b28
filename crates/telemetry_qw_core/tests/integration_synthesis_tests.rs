mod support;

use std::time::Duration;

use support::StackFixture;
use telemetry_qw_core::error::{IndexConfigError, SynthError};
use telemetry_qw_core::intrinsics::Expr;
use telemetry_qw_core::service::{
    ENV_INDEX_BUCKET, ENV_INDEX_CONFIG_URI, ENV_INDEX_ID, ENV_METASTORE_BUCKET,
    INDEX_STORE_BUCKET_NAME,
};
use telemetry_qw_core::stack::{
    INDEX_CONFIG_ASSET_ID, INDEX_STORE_EXPORT_NAME, INDEX_STORE_OUTPUT_ID,
};
use telemetry_qw_core::{synthesize, StackConfig};

#[test]
fn otel_traces_scenario_uses_defaults_and_exports_bucket() {
    let fixture = StackFixture::otel_traces();
    let synthesis = synthesize(&fixture.config, &fixture.index_config_path).unwrap();
    let service = &synthesis.service;

    assert_eq!(service.indexer.memory_size, 8000);
    assert_eq!(service.searcher.memory_size, 3008);
    for unit in service.compute_units() {
        assert_eq!(
            unit.environment.get(ENV_INDEX_ID),
            Some(&Expr::literal("otel-traces"))
        );
    }

    let output = synthesis.output(INDEX_STORE_OUTPUT_ID).expect("bucket output");
    assert_eq!(output.export_name.as_deref(), Some(INDEX_STORE_EXPORT_NAME));
    assert_eq!(
        synthesis.resolve_static(&output.value).as_deref(),
        Some("telemetry-index-store")
    );
}

#[test]
fn both_units_share_bucket_and_index_id() {
    let fixture = StackFixture::otel_traces();
    let synthesis = synthesize(&fixture.config, &fixture.index_config_path).unwrap();
    let [indexer, searcher] = synthesis.service.compute_units();

    for key in [ENV_INDEX_BUCKET, ENV_METASTORE_BUCKET, ENV_INDEX_ID] {
        assert_eq!(indexer.environment.get(key), searcher.environment.get(key));
    }
    assert_eq!(
        synthesis
            .resolve_static(&indexer.environment[ENV_METASTORE_BUCKET])
            .as_deref(),
        Some(INDEX_STORE_BUCKET_NAME)
    );
    assert!(!searcher.environment.contains_key(ENV_INDEX_CONFIG_URI));
}

#[test]
fn indexer_config_uri_targets_the_published_asset() {
    let fixture = StackFixture::otel_traces();
    let config = StackConfig {
        account: Some("123456789012".to_string()),
        ..fixture.config.clone()
    };
    let synthesis = synthesize(&config, &fixture.index_config_path).unwrap();
    let asset = synthesis.asset(INDEX_CONFIG_ASSET_ID).expect("config asset");

    assert_eq!(
        synthesis.service.indexer.environment.get(ENV_INDEX_CONFIG_URI),
        Some(&Expr::literal(format!(
            "s3://cdk-hnb659fds-assets-123456789012-eu-west-1/{}.yaml",
            asset.fingerprint
        )))
    );
}

#[test]
fn limits_hold_for_any_memory_size() {
    let fixture = StackFixture::otel_traces();
    for (indexer_memory, searcher_memory) in [(128, 128), (2048, 4096), (10_240, 10_240)] {
        let config = StackConfig {
            indexer_memory_size: Some(indexer_memory),
            searcher_memory_size: Some(searcher_memory),
            ..fixture.config.clone()
        };
        let synthesis = synthesize(&config, &fixture.index_config_path).unwrap();
        let service = &synthesis.service;

        assert_eq!(service.indexer.memory_size, indexer_memory);
        assert_eq!(service.searcher.memory_size, searcher_memory);
        assert_eq!(service.indexer.timeout, Duration::from_secs(15 * 60));
        assert_eq!(service.searcher.timeout, Duration::from_secs(30));
        assert_eq!(service.indexer.reserved_concurrent_executions(), 1);
        assert_eq!(service.searcher.reserved_concurrent_executions(), 1);
    }
}

#[test]
fn missing_index_id_aborts_synthesis() {
    let fixture = StackFixture::new("version: 0.7\ndoc_mapping: {}\n");
    let error = synthesize(&fixture.config, &fixture.index_config_path).unwrap_err();
    assert!(matches!(
        error,
        SynthError::IndexConfig(IndexConfigError::MissingIndexId { .. })
    ));
}

#[test]
fn missing_index_config_file_aborts_synthesis() {
    let fixture = StackFixture::otel_traces();
    let absent = fixture.dir.path().join("absent.yaml");
    let error = synthesize(&fixture.config, absent).unwrap_err();
    assert!(matches!(
        error,
        SynthError::IndexConfig(IndexConfigError::Read { .. })
    ));
}

#[test]
fn missing_package_is_reported_after_config_loads() {
    let fixture = StackFixture::otel_traces();
    let config = StackConfig {
        searcher_package_location: fixture.dir.path().join("not-built.zip"),
        ..fixture.config.clone()
    };
    let error = synthesize(&config, &fixture.index_config_path).unwrap_err();
    assert!(matches!(error, SynthError::Asset(_)));
}

#[test]
fn invalid_parameters_are_rejected_before_reading_inputs() {
    let fixture = StackFixture::otel_traces();
    let config = StackConfig {
        indexer_memory_size: Some(20_000),
        ..fixture.config.clone()
    };
    let error = synthesize(&config, fixture.dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(error, SynthError::Validation(_)));
}
