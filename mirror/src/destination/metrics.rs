use std::sync::Once;

use metrics::{Unit, describe_histogram};

static REGISTER_METRICS: Once = Once::new();

/// Duration of DDL statements sent to the destination.
/// Labels: `table`.
pub const MIRROR_DDL_DURATION_SECONDS: &str = "mirror_ddl_duration_seconds";

/// Duration of a staged bulk load, from statement submission to completion.
/// Labels: `table`.
pub const MIRROR_LOAD_DURATION_SECONDS: &str = "mirror_load_duration_seconds";

/// Duration of the drop-and-rename swap publishing the staged data.
/// Labels: `table`.
pub const MIRROR_SWAP_DURATION_SECONDS: &str = "mirror_swap_duration_seconds";

/// Register destination-side metrics.
///
/// Safe to call multiple times — registration happens only once.
pub(crate) fn register_metrics() {
    REGISTER_METRICS.call_once(|| {
        describe_histogram!(
            MIRROR_DDL_DURATION_SECONDS,
            Unit::Seconds,
            "Duration of DDL statements sent to the destination, labeled by table"
        );

        describe_histogram!(
            MIRROR_LOAD_DURATION_SECONDS,
            Unit::Seconds,
            "Duration of staged bulk loads, labeled by table"
        );

        describe_histogram!(
            MIRROR_SWAP_DURATION_SECONDS,
            Unit::Seconds,
            "Duration of the drop-and-rename swap, labeled by table"
        );
    });
}
