//! Command line surface and AWS adapters for the telemetry Quickwit stack.
//!
//! Synthesis itself lives in `telemetry_qw_core`; this crate writes its
//! artifacts to disk and publishes staged assets to S3.

pub mod adapters;
pub mod cli;
pub mod commands;
pub mod publish;
