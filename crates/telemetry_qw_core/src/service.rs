//! The Quickwit service: one index store bucket shared by an indexer and a
//! searcher function.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::debug;

use crate::asset::AssetLocation;
use crate::intrinsics::Expr;
use crate::resources::{ComputeUnit, PolicyStatement, RemovalPolicy, Runtime, StorageResource};

pub const DEFAULT_INDEXER_MEMORY_SIZE: u32 = 8000;
pub const DEFAULT_SEARCHER_MEMORY_SIZE: u32 = 3008;

pub const INDEX_STORE_BUCKET_NAME: &str = "telemetry-index-store";
pub const INDEX_STORE_LOGICAL_ID: &str = "TelemetryIndexStore";

pub const INDEXER_LOGICAL_ID: &str = "QuickwitIndexerLambda";
pub const INDEXER_FUNCTION_NAME: &str = "telemetry-indexer-lamdba";
pub const INDEXER_TIMEOUT: Duration = Duration::from_secs(15 * 60);

pub const SEARCHER_LOGICAL_ID: &str = "QuickwitSearcherLambda";
pub const SEARCHER_FUNCTION_NAME: &str = "telemetry-searcher-lamdba";
pub const SEARCHER_TIMEOUT: Duration = Duration::from_secs(30);

/// 10 GiB of `/tmp` for split downloads and merges.
pub const EPHEMERAL_STORAGE_MIB: u32 = 10 * 1024;

/// Public reference datasets the indexer may ingest from.
pub const PUBLIC_DATASETS_OBJECTS_ARN: &str = "arn:aws:s3:::quickwit-datasets-public/*";

pub const ENV_INDEX_BUCKET: &str = "QW_LAMBDA_INDEX_BUCKET";
pub const ENV_METASTORE_BUCKET: &str = "QW_LAMBDA_METASTORE_BUCKET";
pub const ENV_INDEX_ID: &str = "QW_LAMBDA_INDEX_ID";
pub const ENV_INDEX_CONFIG_URI: &str = "QW_LAMBDA_INDEX_CONFIG_URI";

const LAMBDA_HANDLER: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickwitServiceProps {
    pub index_id: String,
    /// Published location of the index config document.
    pub index_config: AssetLocation,
    pub indexer_package: AssetLocation,
    pub searcher_package: AssetLocation,
    /// Defaults to [`DEFAULT_INDEXER_MEMORY_SIZE`].
    pub indexer_memory_size: Option<u32>,
    /// Defaults to [`DEFAULT_SEARCHER_MEMORY_SIZE`].
    pub searcher_memory_size: Option<u32>,
    /// Accepted for each function but not applied: the deployed environments
    /// carry only the `QW_LAMBDA_*` variables.
    pub indexer_environment: BTreeMap<String, String>,
    pub searcher_environment: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickwitService {
    pub bucket: StorageResource,
    pub indexer: ComputeUnit,
    pub searcher: ComputeUnit,
}

impl QuickwitService {
    pub fn new(props: QuickwitServiceProps) -> Self {
        let bucket = StorageResource {
            logical_id: INDEX_STORE_LOGICAL_ID.to_string(),
            bucket_name: INDEX_STORE_BUCKET_NAME.to_string(),
            removal_policy: RemovalPolicy::Destroy,
            enforce_ssl: true,
        };

        let indexer = indexer_unit(&bucket, &props);
        let searcher = searcher_unit(&bucket, &props);
        debug!(
            index_id = %props.index_id,
            indexer_memory_size = indexer.memory_size,
            searcher_memory_size = searcher.memory_size,
            "declared quickwit service"
        );

        Self {
            bucket,
            indexer,
            searcher,
        }
    }

    pub fn compute_units(&self) -> [&ComputeUnit; 2] {
        [&self.indexer, &self.searcher]
    }
}

fn indexer_unit(bucket: &StorageResource, props: &QuickwitServiceProps) -> ComputeUnit {
    let mut environment = shared_environment(bucket, &props.index_id);
    environment.insert(ENV_INDEX_CONFIG_URI.to_string(), props.index_config.s3_uri());

    let mut unit = ComputeUnit {
        logical_id: INDEXER_LOGICAL_ID.to_string(),
        function_name: INDEXER_FUNCTION_NAME.to_string(),
        code: props.indexer_package.clone(),
        runtime: Runtime::ProvidedAl2,
        handler: LAMBDA_HANDLER.to_string(),
        environment,
        timeout: INDEXER_TIMEOUT,
        memory_size: props
            .indexer_memory_size
            .unwrap_or(DEFAULT_INDEXER_MEMORY_SIZE),
        ephemeral_storage_mib: EPHEMERAL_STORAGE_MIB,
        statements: Vec::new(),
    };

    unit.add_to_role_policy(PolicyStatement::allow(
        ["s3:GetObject"],
        [props.index_config.object_arn()],
    ));
    unit.add_to_role_policy(PolicyStatement::allow(
        ["s3:GetObject"],
        [Expr::literal(PUBLIC_DATASETS_OBJECTS_ARN)],
    ));
    unit.add_to_role_policy(bucket.grant_read_write());
    unit
}

fn searcher_unit(bucket: &StorageResource, props: &QuickwitServiceProps) -> ComputeUnit {
    let mut unit = ComputeUnit {
        logical_id: SEARCHER_LOGICAL_ID.to_string(),
        function_name: SEARCHER_FUNCTION_NAME.to_string(),
        code: props.searcher_package.clone(),
        runtime: Runtime::ProvidedAl2,
        handler: LAMBDA_HANDLER.to_string(),
        environment: shared_environment(bucket, &props.index_id),
        timeout: SEARCHER_TIMEOUT,
        memory_size: props
            .searcher_memory_size
            .unwrap_or(DEFAULT_SEARCHER_MEMORY_SIZE),
        ephemeral_storage_mib: EPHEMERAL_STORAGE_MIB,
        statements: Vec::new(),
    };

    // Read is all the searcher needs, but the grant has always been read-write.
    unit.add_to_role_policy(bucket.grant_read_write());
    unit
}

fn shared_environment(bucket: &StorageResource, index_id: &str) -> BTreeMap<String, Expr> {
    let mut environment = BTreeMap::new();
    environment.insert(ENV_INDEX_BUCKET.to_string(), bucket.bucket_ref());
    environment.insert(ENV_METASTORE_BUCKET.to_string(), bucket.bucket_ref());
    environment.insert(ENV_INDEX_ID.to_string(), Expr::literal(index_id));
    environment
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(key: &str) -> AssetLocation {
        AssetLocation {
            bucket: Expr::literal("assets"),
            key: key.to_string(),
        }
    }

    fn environment_keys(unit: &ComputeUnit) -> Vec<&str> {
        unit.environment.keys().map(String::as_str).collect()
    }

    fn props() -> QuickwitServiceProps {
        QuickwitServiceProps {
            index_id: "otel-traces".to_string(),
            index_config: location("config.yaml"),
            indexer_package: location("indexer.zip"),
            searcher_package: location("searcher.zip"),
            indexer_memory_size: None,
            searcher_memory_size: None,
            indexer_environment: BTreeMap::new(),
            searcher_environment: BTreeMap::new(),
        }
    }

    #[test]
    fn memory_sizes_default_when_unspecified() {
        let service = QuickwitService::new(props());
        assert_eq!(service.indexer.memory_size, DEFAULT_INDEXER_MEMORY_SIZE);
        assert_eq!(service.searcher.memory_size, DEFAULT_SEARCHER_MEMORY_SIZE);
    }

    #[test]
    fn fixed_characteristics_ignore_memory_choice() {
        let service = QuickwitService::new(QuickwitServiceProps {
            indexer_memory_size: Some(1024),
            searcher_memory_size: Some(10_240),
            ..props()
        });

        assert_eq!(service.indexer.memory_size, 1024);
        assert_eq!(service.indexer.timeout, Duration::from_secs(900));
        assert_eq!(service.searcher.timeout, Duration::from_secs(30));
        for unit in service.compute_units() {
            assert_eq!(unit.reserved_concurrent_executions(), 1);
            assert_eq!(unit.ephemeral_storage_mib, 10_240);
            assert_eq!(unit.runtime, Runtime::ProvidedAl2);
        }
    }

    #[test]
    fn indexer_environment_points_at_config_object() {
        let service = QuickwitService::new(props());
        let environment = &service.indexer.environment;

        assert_eq!(
            environment.get(ENV_INDEX_CONFIG_URI),
            Some(&Expr::literal("s3://assets/config.yaml"))
        );
        assert_eq!(
            environment.get(ENV_INDEX_BUCKET),
            Some(&Expr::reference(INDEX_STORE_LOGICAL_ID))
        );
        assert_eq!(environment.get(ENV_INDEX_BUCKET), environment.get(ENV_METASTORE_BUCKET));
        assert!(!service.searcher.environment.contains_key(ENV_INDEX_CONFIG_URI));
    }

    #[test]
    fn environments_carry_only_quickwit_variables() {
        let overlay = BTreeMap::from([
            ("RUST_LOG".to_string(), "quickwit=debug".to_string()),
            (ENV_INDEX_ID.to_string(), "hijacked".to_string()),
        ]);
        let service = QuickwitService::new(QuickwitServiceProps {
            indexer_environment: overlay.clone(),
            searcher_environment: overlay,
            ..props()
        });

        assert_eq!(
            environment_keys(&service.indexer),
            [
                ENV_INDEX_BUCKET,
                ENV_INDEX_CONFIG_URI,
                ENV_INDEX_ID,
                ENV_METASTORE_BUCKET,
            ]
        );
        assert_eq!(
            environment_keys(&service.searcher),
            [ENV_INDEX_BUCKET, ENV_INDEX_ID, ENV_METASTORE_BUCKET]
        );
        for unit in service.compute_units() {
            assert_eq!(
                unit.environment.get(ENV_INDEX_ID),
                Some(&Expr::literal("otel-traces"))
            );
        }
    }

    #[test]
    fn indexer_grants_cover_config_datasets_and_store() {
        let service = QuickwitService::new(props());
        let statements = &service.indexer.statements;

        assert_eq!(statements.len(), 3);
        assert_eq!(
            statements[0].resources,
            vec![Expr::literal("arn:aws:s3:::assets/config.yaml")]
        );
        assert_eq!(
            statements[1].resources,
            vec![Expr::literal(PUBLIC_DATASETS_OBJECTS_ARN)]
        );
        assert_eq!(statements[2], service.bucket.grant_read_write());
        assert_eq!(service.searcher.statements, vec![service.bucket.grant_read_write()]);
    }
}
