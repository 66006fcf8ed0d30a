//! Object-storage staging: path derivation and post-swap cleanup.

pub mod base;
pub mod gcs;
mod path;

pub use base::StagingStore;
pub use gcs::GcsStagingStore;
pub use path::{STAGING_ROOT, https_url_for, staging_prefix, staging_uri};
