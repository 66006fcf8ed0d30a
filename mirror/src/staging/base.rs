use std::future::Future;

use crate::error::MirrorResult;

/// Trait for the object store holding staged exports.
///
/// The pipeline only ever deletes staged objects through this trait, and only
/// after a successful swap; exports are written by the source engine and read
/// by the destination engine directly.
pub trait StagingStore {
    /// Deletes every object under `prefix` in `bucket`, returning the number
    /// of objects removed.
    fn delete_prefix(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> impl Future<Output = MirrorResult<usize>> + Send;
}
