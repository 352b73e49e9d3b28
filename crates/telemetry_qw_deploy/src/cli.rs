use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use telemetry_qw_core::error::ConfigError;
use telemetry_qw_core::index_config::resolve_index_config_path;
use telemetry_qw_core::StackConfig;

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "telemetry-qw",
    about = "Synthesize and publish the telemetry Quickwit stack",
    long_about = "Declares the Quickwit index store bucket and the indexer and searcher\n\
                  Lambda functions as a CloudFormation template, and publishes the\n\
                  index config and function packages as assets."
)]
pub struct Cli {
    #[command(flatten)]
    pub stack: StackArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the CloudFormation template and asset manifest
    Synth {
        /// Output directory
        #[arg(long, env = "TELEMETRY_QW_OUT", default_value = "cdk.out")]
        out: PathBuf,
    },
    /// Upload staged assets that are not yet in the assets bucket
    Publish {
        /// Only list what would be uploaded
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the declared functions, their environment and the stack outputs
    Show,
}

/// Stack parameters. Flags override the parameters file, which overrides the
/// CODE defaults.
#[derive(Args, Debug, Default)]
pub struct StackArgs {
    /// YAML file with stack parameters
    #[arg(long, global = true, env = "TELEMETRY_QW_PARAMS")]
    pub params: Option<PathBuf>,
    /// Index config document [default: $INDEX_CONFIG_PATH or index-config.yaml]
    #[arg(long, global = true)]
    pub index_config: Option<PathBuf>,
    #[arg(long, global = true, env = "TELEMETRY_QW_STAGE")]
    pub stage: Option<String>,
    #[arg(long, global = true, env = "TELEMETRY_QW_REGION")]
    pub region: Option<String>,
    #[arg(long, global = true, env = "TELEMETRY_QW_ACCOUNT")]
    pub account: Option<String>,
    #[arg(long, global = true)]
    pub stack_id: Option<String>,
    #[arg(long, global = true, env = "TELEMETRY_QW_INDEXER_MEMORY_SIZE")]
    pub indexer_memory_size: Option<u32>,
    #[arg(long, global = true, env = "TELEMETRY_QW_SEARCHER_MEMORY_SIZE")]
    pub searcher_memory_size: Option<u32>,
    /// Indexer package (zip file or directory)
    #[arg(long, global = true, env = "TELEMETRY_QW_INDEXER_PACKAGE")]
    pub indexer_package: Option<PathBuf>,
    /// Searcher package (zip file or directory)
    #[arg(long, global = true, env = "TELEMETRY_QW_SEARCHER_PACKAGE")]
    pub searcher_package: Option<PathBuf>,
    #[arg(long, global = true, env = "TELEMETRY_QW_ASSETS_BUCKET")]
    pub assets_bucket: Option<String>,
}

impl StackArgs {
    pub fn stack_config(&self) -> Result<StackConfig, ConfigError> {
        let mut config = match &self.params {
            Some(path) => StackConfig::from_yaml_file(path)?,
            None => StackConfig::default(),
        };

        if let Some(stage) = &self.stage {
            config.stage = stage.clone();
        }
        if let Some(region) = &self.region {
            config.region = region.clone();
        }
        if let Some(account) = &self.account {
            config.account = Some(account.clone());
        }
        if let Some(stack_id) = &self.stack_id {
            config.stack_id = Some(stack_id.clone());
        }
        if let Some(size) = self.indexer_memory_size {
            config.indexer_memory_size = Some(size);
        }
        if let Some(size) = self.searcher_memory_size {
            config.searcher_memory_size = Some(size);
        }
        if let Some(location) = &self.indexer_package {
            config.indexer_package_location = location.clone();
        }
        if let Some(location) = &self.searcher_package {
            config.searcher_package_location = location.clone();
        }
        if let Some(bucket) = &self.assets_bucket {
            config.assets_bucket = Some(bucket.clone());
        }

        config.validate()?;
        Ok(config)
    }

    pub fn index_config_path(&self) -> PathBuf {
        self.index_config
            .clone()
            .unwrap_or_else(resolve_index_config_path)
    }
}
