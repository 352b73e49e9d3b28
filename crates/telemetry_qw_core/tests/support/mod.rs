use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use telemetry_qw_core::StackConfig;

/// A scratch directory holding an index config document and two fake
/// function packages.
pub struct StackFixture {
    pub dir: TempDir,
    pub index_config_path: PathBuf,
    pub config: StackConfig,
}

impl StackFixture {
    pub fn new(index_config: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let index_config_path = dir.path().join("index-config.yaml");
        fs::write(&index_config_path, index_config).expect("write index config");

        let indexer_package = dir.path().join("quickwit-lambda-indexer.zip");
        let searcher_package = dir.path().join("quickwit-lambda-searcher.zip");
        fs::write(&indexer_package, b"indexer package bytes").expect("write indexer");
        fs::write(&searcher_package, b"searcher package bytes").expect("write searcher");

        let config = StackConfig {
            indexer_package_location: indexer_package,
            searcher_package_location: searcher_package,
            ..Default::default()
        };

        Self {
            dir,
            index_config_path,
            config,
        }
    }

    pub fn otel_traces() -> Self {
        Self::new("version: 0.7\nindex_id: otel-traces\ndoc_mapping:\n  mode: dynamic\n")
    }
}
