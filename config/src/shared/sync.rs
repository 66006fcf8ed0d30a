use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Named destination-side indexes: index name to the ordered list of columns
/// it covers.
///
/// A [`BTreeMap`] keeps DDL generation deterministic across runs.
pub type IndexSpec = BTreeMap<String, Vec<String>>;

/// Reference to the source table of one sync run.
///
/// Resolved against live source metadata on every run; never cached across
/// runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTableRef {
    /// Cloud project owning the dataset.
    pub project: String,
    /// Dataset containing the table.
    pub dataset: String,
    /// Table to snapshot.
    pub table: String,
}

impl fmt::Display for SourceTableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

/// How a sync replaces destination data.
///
/// Both modes currently take the full-snapshot path: the table is exported,
/// staged and swapped whole. The distinction is carried through for the
/// scheduling layer, which tracks it per stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyMode {
    Incremental,
    Overwrite,
}

impl Default for CopyMode {
    fn default() -> Self {
        Self::Overwrite
    }
}

/// Retry budget applied at the pipeline boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum number of attempts for a sync, including the first one.
    #[serde(default = "default_retry_max_attempts")]
    pub max_attempts: u32,
    /// Base delay in milliseconds between attempts; doubled per attempt.
    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

impl RetryConfig {
    /// Default number of attempts per sync.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    /// Default base delay between attempts, in milliseconds.
    pub const DEFAULT_DELAY_MS: u64 = 500;
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_retry_max_attempts(),
            delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_retry_max_attempts() -> u32 {
    RetryConfig::DEFAULT_MAX_ATTEMPTS
}

fn default_retry_delay_ms() -> u64 {
    RetryConfig::DEFAULT_DELAY_MS
}

/// Configuration for one sync run.
///
/// `sync_id` is caller-supplied and must be unique per logical replication
/// stream: it scopes both the staging path in the bucket and the staging
/// table name at the destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncJobConfig {
    /// Unique identifier for this sync stream.
    pub sync_id: String,
    /// Source table to snapshot.
    pub source: SourceTableRef,
    /// Name of the live destination table.
    pub destination_table_name: String,
    /// Bucket the export is staged in.
    pub staging_bucket: String,
    /// Destination-side indexes to declare on created tables.
    #[serde(default)]
    pub index: IndexSpec,
    /// How destination data is replaced.
    #[serde(default)]
    pub copy_mode: CopyMode,
    /// Retry budget for the run.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl SyncJobConfig {
    /// Validates the job configuration.
    ///
    /// Performs no I/O; the pipeline calls this before touching any external
    /// system.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.sync_id.is_empty() {
            return Err(ValidationError::SyncIdEmpty);
        }

        if !is_valid_identifier(&self.destination_table_name) {
            return Err(ValidationError::DestinationTableNameInvalid(
                self.destination_table_name.clone(),
            ));
        }

        if self.staging_bucket.is_empty() {
            return Err(ValidationError::StagingBucketEmpty);
        }

        for (field, value) in [
            ("project", &self.source.project),
            ("dataset", &self.source.dataset),
            ("table", &self.source.table),
        ] {
            if value.is_empty() {
                return Err(ValidationError::SourceTableRefFieldEmpty(field));
            }
        }

        for (name, columns) in &self.index {
            if !is_valid_identifier(name) {
                return Err(ValidationError::IndexSpecInvalid(format!(
                    "index name `{name}` is not a valid identifier"
                )));
            }
            if columns.is_empty() {
                return Err(ValidationError::IndexSpecInvalid(format!(
                    "index `{name}` has no columns"
                )));
            }
        }

        if self.retry.max_attempts == 0 {
            return Err(ValidationError::RetryMaxAttemptsZero);
        }

        Ok(())
    }
}

/// Returns whether `name` is usable as an unquoted destination identifier.
fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> SyncJobConfig {
        SyncJobConfig {
            sync_id: "2024_07_01".to_string(),
            source: SourceTableRef {
                project: "analytics-prod".to_string(),
                dataset: "marts".to_string(),
                table: "events".to_string(),
            },
            destination_table_name: "events".to_string(),
            staging_bucket: "staging-bucket".to_string(),
            index: IndexSpec::new(),
            copy_mode: CopyMode::Overwrite,
            retry: RetryConfig::default(),
        }
    }

    #[test]
    fn valid_job_passes_validation() {
        assert!(job().validate().is_ok());
    }

    #[test]
    fn empty_sync_id_is_rejected() {
        let mut job = job();
        job.sync_id.clear();
        assert!(matches!(job.validate(), Err(ValidationError::SyncIdEmpty)));
    }

    #[test]
    fn destination_name_must_be_identifier() {
        let mut job = job();
        job.destination_table_name = "1events".to_string();
        assert!(matches!(
            job.validate(),
            Err(ValidationError::DestinationTableNameInvalid(_))
        ));

        job.destination_table_name = "events;drop".to_string();
        assert!(job.validate().is_err());
    }

    #[test]
    fn index_with_no_columns_is_rejected() {
        let mut job = job();
        job.index.insert("idx_time".to_string(), vec![]);
        assert!(matches!(
            job.validate(),
            Err(ValidationError::IndexSpecInvalid(_))
        ));
    }

    #[test]
    fn zero_retry_attempts_are_rejected() {
        let mut job = job();
        job.retry.max_attempts = 0;
        assert!(matches!(
            job.validate(),
            Err(ValidationError::RetryMaxAttemptsZero)
        ));
    }

    #[test]
    fn source_ref_renders_fully_qualified() {
        assert_eq!(job().source.to_string(), "analytics-prod.marts.events");
    }
}
