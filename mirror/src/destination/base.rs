use std::future::Future;

use crate::error::MirrorResult;
use crate::types::{ColumnSchema, IndexSpec};

/// Trait for destination engines a staged snapshot is published into.
///
/// One implementation exists per supported engine; the pipeline drives the
/// engine exclusively through these four primitives. Implementations surface
/// errors immediately — retry policy lives at the pipeline boundary so it
/// stays centrally auditable.
pub trait DestinationClient {
    /// Creates `name` with the given columns and indexes.
    ///
    /// With `if_not_exists` set, an existing table is left untouched. Without
    /// it, creation of an existing table must fail loudly: the pipeline
    /// relies on that to detect staging-name collisions.
    fn create_table(
        &self,
        name: &str,
        columns: &[ColumnSchema],
        indexes: &IndexSpec,
        if_not_exists: bool,
    ) -> impl Future<Output = MirrorResult<()>> + Send;

    /// Bulk-loads the shard files addressed by `source_url` into `name`.
    fn load_from_url(
        &self,
        name: &str,
        source_url: &str,
    ) -> impl Future<Output = MirrorResult<()>> + Send;

    /// Drops `name`.
    fn drop_table(&self, name: &str) -> impl Future<Output = MirrorResult<()>> + Send;

    /// Renames `old_name` to `new_name`.
    fn rename_table(
        &self,
        old_name: &str,
        new_name: &str,
    ) -> impl Future<Output = MirrorResult<()>> + Send;
}
