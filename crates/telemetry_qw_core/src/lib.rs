//! Deterministic synthesis of the telemetry Quickwit stack.
//!
//! This crate owns the declaration of the index store bucket, the indexer and
//! searcher Lambda functions, their IAM grants, and the rendering of all of it
//! into a CloudFormation template plus an asset manifest. It intentionally
//! excludes AWS SDK concerns; publishing lives in `telemetry_qw_deploy`.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use telemetry_qw_core::{synthesize, StackConfig};
//!
//! let config = StackConfig::default();
//! let synthesis = synthesize(&config, Path::new("index-config.yaml")).unwrap();
//! println!("{}", synthesis.to_template_string());
//! ```

pub mod asset;
pub mod config;
pub mod error;
pub mod index_config;
pub mod intrinsics;
pub mod resources;
pub mod service;
pub mod stack;
pub mod template;

pub use config::StackConfig;
pub use error::{AssetError, ConfigError, IndexConfigError, SynthError, ValidationError};
pub use index_config::IndexConfigDocument;
pub use service::{QuickwitService, QuickwitServiceProps};
pub use stack::{synthesize, StackSynthesis};
