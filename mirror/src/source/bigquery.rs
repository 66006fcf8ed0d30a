use std::time::{Duration, Instant};

use gcp_bigquery_client::Client;
use gcp_bigquery_client::model::job::Job;
use gcp_bigquery_client::model::job_configuration::JobConfiguration;
use gcp_bigquery_client::model::job_configuration_extract::JobConfigurationExtract;
use gcp_bigquery_client::model::table_reference::TableReference;
use gcp_bigquery_client::yup_oauth2::parse_service_account_key;
use secrecy::ExposeSecret;
use tracing::{debug, info};

use config::shared::GcpCredentialsConfig;

use crate::error::{ErrorKind, MirrorResult};
use crate::mirror_error;
use crate::source::metrics::{MIRROR_EXPORT_DURATION_SECONDS, register_metrics};
use crate::source::base::SourceClient;
use crate::types::{SourceColumn, SourceTableRef, SourceType};

/// Shard file name pattern appended to the staging directory. BigQuery
/// replaces the `*` with the shard number.
const EXPORT_SHARD_PATTERN: &str = "*.parquet";

/// Export format requested from the extract job.
const EXPORT_FORMAT: &str = "PARQUET";

/// How often a running extract job is polled for completion.
const EXPORT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// A [`SourceClient`] backed by Google BigQuery.
///
/// Schema resolution uses the tables API; exports run as extract jobs that
/// write Parquet shards to GCS and are polled to completion.
pub struct BigQuerySourceClient {
    client: Client,
}

impl BigQuerySourceClient {
    /// Creates a new [`BigQuerySourceClient`] from a service account key.
    pub async fn new(credentials: &GcpCredentialsConfig) -> MirrorResult<Self> {
        register_metrics();

        let key = parse_service_account_key(credentials.service_account_key.expose_secret())
            .map_err(|e| {
                mirror_error!(
                    ErrorKind::ConfigurationError,
                    "Invalid service account key",
                    e
                )
            })?;
        let client = Client::from_service_account_key(key, false)
            .await
            .map_err(|e| {
                mirror_error!(
                    ErrorKind::SourceConnectionFailed,
                    "Failed to authenticate with BigQuery",
                    e
                )
            })?;

        Ok(Self { client })
    }

    /// Waits for an extract job to finish, surfacing the job's error result
    /// if it completed unsuccessfully.
    async fn wait_for_job(&self, project_id: &str, inserted: Job) -> MirrorResult<()> {
        let job_reference = inserted.job_reference.ok_or_else(|| {
            mirror_error!(
                ErrorKind::SourceUnavailable,
                "Export job was accepted without a job reference"
            )
        })?;
        let job_id = job_reference.job_id.ok_or_else(|| {
            mirror_error!(
                ErrorKind::SourceUnavailable,
                "Export job was accepted without a job id"
            )
        })?;
        let location = job_reference.location;

        loop {
            let job = self
                .client
                .job()
                .get_job(project_id, &job_id, location.as_deref())
                .await?;

            let Some(status) = job.status else {
                tokio::time::sleep(EXPORT_POLL_INTERVAL).await;
                continue;
            };

            if status.state.as_deref() != Some("DONE") {
                debug!(job_id = %job_id, state = ?status.state, "export job still running");
                tokio::time::sleep(EXPORT_POLL_INTERVAL).await;
                continue;
            }

            if let Some(error) = status.error_result {
                return Err(mirror_error!(
                    ErrorKind::SourceUnavailable,
                    "Export job failed",
                    error.message.unwrap_or_else(|| "no error message".to_string())
                ));
            }

            return Ok(());
        }
    }
}

impl SourceClient for BigQuerySourceClient {
    async fn fetch_table_columns(
        &self,
        table: &SourceTableRef,
    ) -> MirrorResult<Vec<SourceColumn>> {
        let metadata = self
            .client
            .table()
            .get(&table.project, &table.dataset, &table.table, None)
            .await?;

        let fields = metadata.schema.fields.unwrap_or_default();
        let columns = fields
            .into_iter()
            .map(|field| {
                // The REST enum's debug form is the type name in mixed case
                // (`Bignumeric`); the translator expects the upper-case wire
                // spelling.
                let type_name = format!("{:?}", field.r#type).to_uppercase();
                SourceColumn::new(field.name, SourceType::from_name(&type_name))
            })
            .collect();

        Ok(columns)
    }

    async fn export_table(
        &self,
        table: &SourceTableRef,
        destination_uri: &str,
    ) -> MirrorResult<String> {
        let glob = format!("{destination_uri}/{EXPORT_SHARD_PATTERN}");

        let job = Job {
            configuration: Some(JobConfiguration {
                extract: Some(JobConfigurationExtract {
                    source_table: Some(TableReference::new(
                        &table.project,
                        &table.dataset,
                        &table.table,
                    )),
                    destination_uris: Some(vec![glob.clone()]),
                    destination_format: Some(EXPORT_FORMAT.to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        let export_start = Instant::now();
        let inserted = self.client.job().insert(&table.project, job).await?;
        self.wait_for_job(&table.project, inserted).await?;
        metrics::histogram!(MIRROR_EXPORT_DURATION_SECONDS, "table" => table.table.clone())
            .record(export_start.elapsed().as_secs_f64());

        info!(source = %table, glob = %glob, "exported table snapshot");

        Ok(glob)
    }
}
