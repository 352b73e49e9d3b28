//! Publishing of staged assets to their destination bucket.
//!
//! Keys are content hashes, so an object that already exists is never
//! uploaded again.

use std::collections::BTreeSet;

use telemetry_qw_core::asset::FileAsset;
use telemetry_qw_core::error::AssetError;
use telemetry_qw_core::StackSynthesis;
use thiserror::Error;
use tracing::{debug, info};

use crate::adapters::asset_store::AssetStore;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error(
        "asset {asset} targets bucket '{bucket}', which is only known at deploy time; \
         set an account or an explicit assets bucket"
    )]
    UnresolvedBucket { asset: String, bucket: String },
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("failed to publish asset {asset}: {message}")]
    Store { asset: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUpload {
    pub asset_id: String,
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub uploaded: Vec<PlannedUpload>,
    pub skipped: Vec<PlannedUpload>,
}

/// Resolves every asset destination, failing before any upload when one
/// cannot be resolved. Assets sharing a destination are listed once.
pub fn plan_uploads(synthesis: &StackSynthesis) -> Result<Vec<PlannedUpload>, PublishError> {
    Ok(planned_assets(synthesis)?
        .into_iter()
        .map(|(_, upload)| upload)
        .collect())
}

fn planned_assets(
    synthesis: &StackSynthesis,
) -> Result<Vec<(&FileAsset, PlannedUpload)>, PublishError> {
    let mut seen = BTreeSet::new();
    let mut plan = Vec::with_capacity(synthesis.assets.len());

    for asset in &synthesis.assets {
        let bucket = resolve_bucket(asset)?;
        if !seen.insert((bucket.clone(), asset.location.key.clone())) {
            continue;
        }
        plan.push((
            asset,
            PlannedUpload {
                asset_id: asset.id.clone(),
                bucket,
                key: asset.location.key.clone(),
            },
        ));
    }

    Ok(plan)
}

pub fn publish_assets(
    synthesis: &StackSynthesis,
    store: &dyn AssetStore,
) -> Result<PublishReport, PublishError> {
    let mut report = PublishReport::default();

    for (asset, upload) in planned_assets(synthesis)? {
        let store_error = |message| PublishError::Store {
            asset: upload.asset_id.clone(),
            message,
        };

        if store
            .object_exists(&upload.bucket, &upload.key)
            .map_err(store_error)?
        {
            debug!(asset = %upload.asset_id, key = %upload.key, "asset already published");
            report.skipped.push(upload);
            continue;
        }

        let body = asset.contents()?;
        store
            .put_object(&upload.bucket, &upload.key, body)
            .map_err(store_error)?;
        info!(
            asset = %upload.asset_id,
            bucket = %upload.bucket,
            key = %upload.key,
            "published asset"
        );
        report.uploaded.push(upload);
    }

    Ok(report)
}

fn resolve_bucket(asset: &FileAsset) -> Result<String, PublishError> {
    asset
        .location
        .bucket
        .as_literal()
        .map(str::to_string)
        .ok_or_else(|| PublishError::UnresolvedBucket {
            asset: asset.id.clone(),
            bucket: asset.location.bucket.display_template(),
        })
}
