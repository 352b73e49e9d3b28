//! Top-level assembly: index config → assets → service → outputs.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::info;

use crate::asset::FileAsset;
use crate::config::StackConfig;
use crate::error::SynthError;
use crate::index_config::IndexConfigDocument;
use crate::intrinsics::Expr;
use crate::resources::StackOutput;
use crate::service::{QuickwitService, QuickwitServiceProps};

pub const INDEX_CONFIG_ASSET_ID: &str = "IndexConfigAsset";
pub const INDEXER_CODE_ASSET_ID: &str = "QuickwitIndexerCode";
pub const SEARCHER_CODE_ASSET_ID: &str = "QuickwitSearcherCode";

pub const INDEX_STORE_OUTPUT_ID: &str = "indexstorebucketname";
pub const INDEX_STORE_EXPORT_NAME: &str = "quickwit-index-store-bucket-name";

/// The full declaration produced by one synthesis pass.
#[derive(Debug, Clone, PartialEq)]
pub struct StackSynthesis {
    pub stack_id: String,
    pub region: String,
    pub tags: BTreeMap<String, String>,
    pub index_config: IndexConfigDocument,
    pub assets: Vec<FileAsset>,
    pub service: QuickwitService,
    pub outputs: Vec<StackOutput>,
}

/// Runs one fail-fast synthesis pass.
///
/// The index config document is read before anything is declared; a missing
/// file or a missing `index_id` aborts with no partial result.
pub fn synthesize(
    config: &StackConfig,
    index_config_path: impl AsRef<Path>,
) -> Result<StackSynthesis, SynthError> {
    config.validate()?;
    let index_config = IndexConfigDocument::load(index_config_path)?;

    let staging = config.asset_staging();
    let config_asset = staging.stage(INDEX_CONFIG_ASSET_ID, &index_config.path)?;
    let indexer_code = staging.stage(INDEXER_CODE_ASSET_ID, &config.indexer_package_location)?;
    let searcher_code = staging.stage(SEARCHER_CODE_ASSET_ID, &config.searcher_package_location)?;

    let service = QuickwitService::new(QuickwitServiceProps {
        index_id: index_config.index_id.clone(),
        index_config: config_asset.location.clone(),
        indexer_package: indexer_code.location.clone(),
        searcher_package: searcher_code.location.clone(),
        indexer_memory_size: config.indexer_memory_size,
        searcher_memory_size: config.searcher_memory_size,
        indexer_environment: config.lambda_environment.clone(),
        searcher_environment: config.lambda_environment.clone(),
    });

    let outputs = vec![StackOutput {
        logical_id: INDEX_STORE_OUTPUT_ID.to_string(),
        value: service.bucket.bucket_ref(),
        export_name: Some(INDEX_STORE_EXPORT_NAME.to_string()),
    }];

    let stack_id = config.stack_id();
    info!(
        stack_id = %stack_id,
        index_id = %index_config.index_id,
        assets = 3,
        "synthesized stack"
    );

    Ok(StackSynthesis {
        stack_id,
        region: config.region.clone(),
        tags: config.tags(),
        index_config,
        assets: vec![config_asset, indexer_code, searcher_code],
        service,
        outputs,
    })
}

impl StackSynthesis {
    pub fn output(&self, logical_id: &str) -> Option<&StackOutput> {
        self.outputs
            .iter()
            .find(|output| output.logical_id == logical_id)
    }

    pub fn asset(&self, id: &str) -> Option<&FileAsset> {
        self.assets.iter().find(|asset| asset.id == id)
    }

    /// Resolves `expr` to a plain string when it only depends on values known
    /// at synthesis time (literals and the fixed-name bucket).
    pub fn resolve_static(&self, expr: &Expr) -> Option<String> {
        match expr {
            Expr::Literal(value) => Some(value.clone()),
            Expr::Ref(logical_id) if *logical_id == self.service.bucket.logical_id => {
                Some(self.service.bucket.bucket_name.clone())
            }
            Expr::Join(separator, parts) => parts
                .iter()
                .map(|part| self.resolve_static(part))
                .collect::<Option<Vec<_>>>()
                .map(|parts| parts.join(separator.as_str())),
            _ => None,
        }
    }
}
