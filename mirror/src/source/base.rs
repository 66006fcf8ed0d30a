use std::future::Future;

use crate::error::MirrorResult;
use crate::types::{SourceColumn, SourceTableRef};

/// Trait for source engines a table snapshot can be pulled from.
///
/// Implementations resolve schemas against live metadata (never a cached
/// snapshot) and delegate the export to the engine's native bulk-export
/// mechanism, which must produce a single consistent snapshot of the table.
///
/// Errors surface immediately; retry policy lives at the pipeline boundary,
/// not in implementations.
pub trait SourceClient {
    /// Fetches the ordered column list of `table` from live metadata.
    fn fetch_table_columns(
        &self,
        table: &SourceTableRef,
    ) -> impl Future<Output = MirrorResult<Vec<SourceColumn>>> + Send;

    /// Exports a consistent snapshot of `table` to shard files under
    /// `destination_uri` and returns the glob addressing the shards.
    ///
    /// The export writes only under `destination_uri`; objects outside that
    /// path are never touched.
    fn export_table(
        &self,
        table: &SourceTableRef,
        destination_uri: &str,
    ) -> impl Future<Output = MirrorResult<String>> + Send;
}
