//! Shared configuration types for mirroring pipelines.

mod base;
mod clickhouse;
mod gcp;
mod sync;

pub use base::ValidationError;
pub use clickhouse::{ClickHouseConnectionConfig, ClickHouseConnectionConfigWithoutSecrets};
pub use gcp::GcpCredentialsConfig;
pub use sync::{CopyMode, IndexSpec, RetryConfig, SourceTableRef, SyncJobConfig};
