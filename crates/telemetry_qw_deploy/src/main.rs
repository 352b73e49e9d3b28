use anyhow::{Context, Result};
use aws_sdk_s3::config::Region;
use clap::Parser;
use telemetry_qw_core::synthesize;
use telemetry_qw_deploy::adapters::s3::S3AssetStore;
use telemetry_qw_deploy::cli::{Cli, Commands};
use telemetry_qw_deploy::commands::{render_summary, write_synth_artifacts};
use telemetry_qw_deploy::publish::{plan_uploads, publish_assets};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()
        .ok();

    let cli = Cli::parse();
    let config = cli.stack.stack_config()?;
    let index_config_path = cli.stack.index_config_path();
    let synthesis = synthesize(&config, &index_config_path)
        .with_context(|| format!("synthesizing stack {}", config.stack_id()))?;

    match cli.command {
        Commands::Synth { out } => {
            let artifacts = write_synth_artifacts(&synthesis, &out)?;
            info!(
                template = %artifacts.template_path.display(),
                manifest = %artifacts.manifest_path.display(),
                "wrote synthesis artifacts"
            );
        }
        Commands::Show => {
            print!("{}", render_summary(&synthesis));
        }
        Commands::Publish { dry_run: true } => {
            for upload in plan_uploads(&synthesis)? {
                println!("{} -> s3://{}/{}", upload.asset_id, upload.bucket, upload.key);
            }
        }
        Commands::Publish { dry_run: false } => {
            let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .region(Region::new(config.region.clone()))
                .load()
                .await;
            let store = S3AssetStore::new(aws_sdk_s3::Client::new(&aws_config));
            let report = publish_assets(&synthesis, &store)?;
            info!(
                uploaded = report.uploaded.len(),
                skipped = report.skipped.len(),
                "published assets"
            );
        }
    }

    Ok(())
}
