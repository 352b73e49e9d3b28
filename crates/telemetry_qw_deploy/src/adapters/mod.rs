pub mod asset_store;
pub mod s3;
