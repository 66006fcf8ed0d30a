use crate::bail;
use crate::error::{ErrorKind, MirrorResult};

/// Top-level directory inside the staging bucket under which every sync
/// stages its export.
pub const STAGING_ROOT: &str = "mirror";

/// HTTPS host serving GCS objects for the destination's URL-based ingestion.
const GCS_HTTP_HOST: &str = "https://storage.googleapis.com";

/// Derives the job-scoped staging directory, relative to the bucket root.
///
/// The path is deterministic in `(sync_id, destination_table_name)`: retries
/// of the same sync reuse it, and syncs of different streams never collide.
pub fn staging_prefix(sync_id: &str, destination_table_name: &str) -> String {
    format!("{STAGING_ROOT}/{sync_id}/{destination_table_name}")
}

/// Renders the `gs://` URI of a staging directory.
pub fn staging_uri(bucket: &str, prefix: &str) -> String {
    format!("gs://{bucket}/{prefix}")
}

/// Converts a `gs://bucket/path` URI or glob into the HTTPS URL the
/// destination engine can read from.
pub fn https_url_for(gs_uri: &str) -> MirrorResult<String> {
    let Some(rest) = gs_uri.strip_prefix("gs://") else {
        bail!(
            ErrorKind::InvalidState,
            "Staging location is not a gs:// URI",
            gs_uri.to_string()
        );
    };

    Ok(format!("{GCS_HTTP_HOST}/{rest}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_deterministic_and_sync_scoped() {
        assert_eq!(
            staging_prefix("2024_07_01", "events"),
            "mirror/2024_07_01/events"
        );
        assert_eq!(
            staging_prefix("2024_07_01", "events"),
            staging_prefix("2024_07_01", "events"),
        );
        assert_ne!(
            staging_prefix("2024_07_01", "events"),
            staging_prefix("2024_07_02", "events"),
        );
    }

    #[test]
    fn uri_and_https_forms_agree() {
        let uri = staging_uri("staging-bucket", "mirror/s1/events");
        assert_eq!(uri, "gs://staging-bucket/mirror/s1/events");
        assert_eq!(
            https_url_for(&uri).unwrap(),
            "https://storage.googleapis.com/staging-bucket/mirror/s1/events"
        );
    }

    #[test]
    fn https_conversion_rejects_non_gs_uris() {
        assert!(https_url_for("s3://bucket/path").is_err());
    }
}
