use secrecy::SecretString;
use serde::Deserialize;

/// Credentials for the Google Cloud side of the pipeline.
///
/// The same service account authenticates both the BigQuery export and the
/// GCS staging cleanup, matching how the deployment provisions access: one
/// principal owns the source dataset read and the staging bucket.
///
/// This intentionally does not implement [`serde::Serialize`] to avoid
/// accidentally leaking the key into serialized forms.
#[derive(Debug, Clone, Deserialize)]
pub struct GcpCredentialsConfig {
    /// Service account key in JSON form.
    pub service_account_key: SecretString,
}
