use std::sync::Once;

use metrics::{Unit, describe_histogram};

static REGISTER_METRICS: Once = Once::new();

/// Duration of a source export, from job submission to completion.
/// Labels: `table`.
pub const MIRROR_EXPORT_DURATION_SECONDS: &str = "mirror_export_duration_seconds";

/// Register source-side metrics.
///
/// Safe to call multiple times — registration happens only once.
pub(crate) fn register_metrics() {
    REGISTER_METRICS.call_once(|| {
        describe_histogram!(
            MIRROR_EXPORT_DURATION_SECONDS,
            Unit::Seconds,
            "Duration of source exports from job submission to completion, labeled by table"
        );
    });
}
