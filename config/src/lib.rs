//! Shared configuration for the mirroring pipeline.
//!
//! Holds the connection settings for the three external systems the pipeline
//! talks to (BigQuery, GCS staging, ClickHouse), the per-job sync
//! configuration, and the hierarchical loader that merges configuration files
//! with environment-variable overrides.

pub mod environment;
mod load;
pub mod shared;

pub use load::{LoadConfigError, load_config};
