//! Source-engine access: live schema resolution and snapshot export.

pub mod base;
pub mod bigquery;
pub mod metrics;

pub use base::SourceClient;
pub use bigquery::BigQuerySourceClient;
