//! Destination-engine access: table DDL, staged loads, and the swap
//! primitives.

pub mod base;
pub mod clickhouse;
pub mod metrics;
mod naming;

pub use base::DestinationClient;
pub use clickhouse::ClickHouseClient;
pub use naming::{MAX_IDENTIFIER_LEN, staging_table_name};
