//! Stack parameters supplied once at assembly time.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::asset::AssetStaging;
use crate::error::{ConfigError, ValidationError};

/// Smallest memory size Lambda accepts (MB).
pub const MIN_MEMORY_SIZE: u32 = 128;
/// Largest memory size Lambda accepts (MB).
pub const MAX_MEMORY_SIZE: u32 = 10_240;

const DEFAULT_APP: &str = "TelemetryQW";
const DEFAULT_STACK: &str = "telemetry";
const DEFAULT_STAGE: &str = "CODE";
const DEFAULT_REGION: &str = "eu-west-1";
const DEFAULT_INDEXER_PACKAGE: &str = "cdk.out/quickwit-lambda-indexer-beta-01-x86_64.zip";
const DEFAULT_SEARCHER_PACKAGE: &str = "cdk.out/quickwit-lambda-searcher-beta-01-x86_64.zip";

/// Parameters for one deployment of the stack.
///
/// Defaults describe the CODE deployment in `eu-west-1`. Memory sizes left as
/// `None` fall back to the service defaults (indexer 8000, searcher 3008).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StackConfig {
    /// Application tag (`App`).
    pub app: String,
    /// Stack tag (`Stack`).
    pub stack: String,
    /// Deployment stage tag (`Stage`), e.g. CODE or PROD.
    pub stage: String,
    pub region: String,
    /// Target account. When unknown the assets bucket is rendered with
    /// `${AWS::AccountId}` and cannot be published to directly.
    pub account: Option<String>,
    /// Explicit stack id; derived from region and stage when unset.
    pub stack_id: Option<String>,
    pub indexer_memory_size: Option<u32>,
    pub searcher_memory_size: Option<u32>,
    /// Prebuilt indexer package: a zip file or a directory to be zipped.
    pub indexer_package_location: PathBuf,
    /// Prebuilt searcher package: a zip file or a directory to be zipped.
    pub searcher_package_location: PathBuf,
    /// Overrides the bootstrap assets bucket.
    pub assets_bucket: Option<String>,
    /// Environment overlays accepted for both functions. They are passed to
    /// the service but not rendered into the function environments.
    pub lambda_environment: BTreeMap<String, String>,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            app: DEFAULT_APP.to_string(),
            stack: DEFAULT_STACK.to_string(),
            stage: DEFAULT_STAGE.to_string(),
            region: DEFAULT_REGION.to_string(),
            account: None,
            stack_id: None,
            indexer_memory_size: None,
            searcher_memory_size: None,
            indexer_package_location: PathBuf::from(DEFAULT_INDEXER_PACKAGE),
            searcher_package_location: PathBuf::from(DEFAULT_SEARCHER_PACKAGE),
            assets_bucket: None,
            lambda_environment: BTreeMap::from([(
                "RUST_LOG".to_string(),
                "quickwit=info".to_string(),
            )]),
        }
    }
}

impl StackConfig {
    /// Loads parameters from a YAML file; missing fields keep their defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (name, value) in [
            ("app", &self.app),
            ("stack", &self.stack),
            ("stage", &self.stage),
            ("region", &self.region),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::new(format!("{name} cannot be empty")));
            }
        }

        if let Some(account) = &self.account {
            if account.len() != 12 || !account.chars().all(|c| c.is_ascii_digit()) {
                return Err(ValidationError::new(format!(
                    "account '{account}' must be a 12 digit AWS account id"
                )));
            }
        }

        if let Some(stack_id) = &self.stack_id {
            if stack_id.trim().is_empty() {
                return Err(ValidationError::new("stack_id cannot be empty"));
            }
        }

        for (name, size) in [
            ("indexer_memory_size", self.indexer_memory_size),
            ("searcher_memory_size", self.searcher_memory_size),
        ] {
            if let Some(size) = size {
                if !(MIN_MEMORY_SIZE..=MAX_MEMORY_SIZE).contains(&size) {
                    return Err(ValidationError::new(format!(
                        "{name} must be between {MIN_MEMORY_SIZE} and {MAX_MEMORY_SIZE} MB, got {size}"
                    )));
                }
            }
        }

        for (name, location) in [
            ("indexer_package_location", &self.indexer_package_location),
            ("searcher_package_location", &self.searcher_package_location),
        ] {
            if location.as_os_str().is_empty() {
                return Err(ValidationError::new(format!("{name} cannot be empty")));
            }
        }

        if let Some(bucket) = &self.assets_bucket {
            if bucket.trim().is_empty() {
                return Err(ValidationError::new("assets_bucket cannot be empty"));
            }
        }

        if self.lambda_environment.keys().any(|key| key.trim().is_empty()) {
            return Err(ValidationError::new(
                "lambda_environment keys must be non-empty strings",
            ));
        }

        Ok(())
    }

    /// Stack id, e.g. `TelemetryQw-euwest-1-CODE` for CODE in `eu-west-1`.
    pub fn stack_id(&self) -> String {
        match &self.stack_id {
            Some(stack_id) => stack_id.clone(),
            None => format!(
                "TelemetryQw-{}-{}",
                self.region.replacen('-', "", 1),
                self.stage
            ),
        }
    }

    /// Standard `App` / `Stack` / `Stage` tags applied to taggable resources.
    pub fn tags(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("App".to_string(), self.app.clone()),
            ("Stack".to_string(), self.stack.clone()),
            ("Stage".to_string(), self.stage.clone()),
        ])
    }

    pub fn asset_staging(&self) -> AssetStaging {
        AssetStaging::for_environment(
            self.account.as_deref(),
            &self.region,
            self.assets_bucket.as_deref(),
        )
    }
}
