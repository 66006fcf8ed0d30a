use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rand::Rng;
use tokio::time::sleep;
use tracing::{error, info, warn};

use config::shared::SyncJobConfig;

use crate::concurrency::signal::{CancelRx, is_cancelled};
use crate::destination::base::DestinationClient;
use crate::destination::metrics::MIRROR_SWAP_DURATION_SECONDS;
use crate::destination::staging_table_name;
use crate::error::{ErrorKind, MirrorError, MirrorResult};
use crate::mirror_error;
use crate::policy::{RetryDirective, build_error_handling_policy};
use crate::schema::translate_columns;
use crate::source::base::SourceClient;
use crate::staging::base::StagingStore;
use crate::staging::{https_url_for, staging_prefix, staging_uri};
use crate::types::{ColumnSchema, SourceTableRef};
use crate::bail;

/// Stages a sync moves through, in order.
///
/// On failure, [`SyncReport::failure_stage`] names the stage that was being
/// entered when the sync failed: a bulk-load failure reports
/// [`SyncStage::StagingLoaded`], a rename failure reports
/// [`SyncStage::Swapped`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    Pending,
    SchemaResolved,
    Exported,
    StagingLoaded,
    Swapped,
    CleanedUp,
}

impl SyncStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStage::Pending => "Pending",
            SyncStage::SchemaResolved => "SchemaResolved",
            SyncStage::Exported => "Exported",
            SyncStage::StagingLoaded => "StagingLoaded",
            SyncStage::Swapped => "Swapped",
            SyncStage::CleanedUp => "CleanedUp",
        }
    }
}

impl std::fmt::Display for SyncStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result record of one sync, handed back to the scheduling layer.
#[derive(Debug)]
pub struct SyncReport {
    /// Whether the live destination table now holds the new snapshot.
    pub success: bool,
    /// The stage the sync failed in, when it did.
    pub failure_stage: Option<SyncStage>,
    /// The source table the sync read from.
    pub source_ref: SourceTableRef,
    /// Glob addressing the exported shard files, once the export ran.
    pub exported_glob: Option<String>,
    /// Name of the live destination table.
    pub destination_table_name: String,
    /// Name of the staging table derived for this sync.
    pub staging_table_name: String,
    /// Whether staged objects were deleted. [`None`] when cleanup never ran;
    /// `Some(false)` is a soft failure: the destination data is correct but
    /// the staged objects are orphaned and billable until reclaimed.
    pub cleanup_succeeded: Option<bool>,
    /// The error that stopped the sync, or the cleanup error accompanying a
    /// soft-failed success.
    pub error: Option<MirrorError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// A failed stage of one attempt.
struct StageFailure {
    stage: SyncStage,
    error: MirrorError,
    /// Whether the attempt had already issued a destination mutation beyond
    /// the idempotent ensure-live step. Once true, the sync is never
    /// auto-retried: the staging table is deliberately left in place for
    /// diagnosis instead of being clobbered by a blind re-run.
    destination_mutated: bool,
}

/// Successful outcome of one attempt.
struct AttemptOutcome {
    exported_glob: String,
    cleanup_succeeded: Option<bool>,
    cleanup_error: Option<MirrorError>,
}

/// Replicates one full snapshot of a source table into the destination and
/// swaps it into place.
///
/// The sequence per run is: resolve schema, translate, export to staging
/// storage, ensure the live table, create and load a staging table, drop the
/// live table, rename the staging table into its place, delete the staged
/// objects. The pipeline halts at the first failing stage and skips all
/// later stages; staged objects and the staging table are preserved on
/// failure so the run can be diagnosed or resumed.
///
/// The drop and rename are two separate statements, not an atomic pair: a
/// reader can observe a window where the live name resolves to nothing, and
/// a failure between them leaves the destination absent until
/// [`SnapshotPipeline::resume_swap`] renames the still-existing staging
/// table into place (or the whole sync is re-run).
///
/// Syncs targeting distinct destination tables may run concurrently — every
/// staging path and staging table name is scoped by `sync_id`. Two
/// concurrent syncs for the *same* destination table are not safe; the
/// scheduler invoking this pipeline must guarantee at most one in-flight
/// sync per destination table.
pub struct SnapshotPipeline<S, D, G> {
    job: SyncJobConfig,
    source: S,
    destination: D,
    staging: G,
    cancel_rx: Option<CancelRx>,
}

impl<S, D, G> SnapshotPipeline<S, D, G>
where
    S: SourceClient + Send + Sync,
    D: DestinationClient + Send + Sync,
    G: StagingStore + Send + Sync,
{
    /// Creates a new pipeline for one sync job.
    ///
    /// Clients arrive already authenticated; the pipeline performs no
    /// credential resolution of its own.
    pub fn new(job: SyncJobConfig, source: S, destination: D, staging: G) -> Self {
        Self {
            job,
            source,
            destination,
            staging,
            cancel_rx: None,
        }
    }

    /// Attaches a cancellation signal.
    ///
    /// Cancellation is checked before each stage: it prevents subsequent
    /// stages from starting but never interrupts an issued external call,
    /// and never deletes an already-swapped live table.
    pub fn with_cancel_signal(mut self, cancel_rx: CancelRx) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    pub fn job(&self) -> &SyncJobConfig {
        &self.job
    }

    /// Runs the sync to completion and returns its result record.
    ///
    /// Bounded retry with backoff is applied here, and only here: attempts
    /// are re-run from scratch while the failure is classified as
    /// automatically retryable and the previous attempt had not yet mutated
    /// the destination. Internal components never retry on their own, so the
    /// retry policy stays centrally auditable.
    pub async fn run(&self) -> SyncReport {
        let started_at = Utc::now();
        let staging_table =
            staging_table_name(&self.job.destination_table_name, &self.job.sync_id);

        info!(
            sync_id = %self.job.sync_id,
            source = %self.job.source,
            destination = %self.job.destination_table_name,
            staging_table = %staging_table,
            "starting snapshot sync"
        );

        if let Err(validation) = self.job.validate() {
            let error = mirror_error!(
                ErrorKind::ConfigurationError,
                "Invalid sync job configuration",
                validation
            );
            error!(%error, "sync rejected before any I/O");
            return self.failure_report(started_at, staging_table, SyncStage::Pending, error);
        }

        let mut attempt: u32 = 1;
        loop {
            match self.run_attempt(&staging_table).await {
                Ok(outcome) => {
                    info!(
                        sync_id = %self.job.sync_id,
                        destination = %self.job.destination_table_name,
                        cleanup_succeeded = ?outcome.cleanup_succeeded,
                        "snapshot sync complete"
                    );

                    return SyncReport {
                        success: true,
                        failure_stage: None,
                        source_ref: self.job.source.clone(),
                        exported_glob: Some(outcome.exported_glob),
                        destination_table_name: self.job.destination_table_name.clone(),
                        staging_table_name: staging_table,
                        cleanup_succeeded: outcome.cleanup_succeeded,
                        error: outcome.cleanup_error,
                        started_at,
                        finished_at: Utc::now(),
                    };
                }
                Err(failure) => {
                    let policy = build_error_handling_policy(&failure.error);
                    let can_retry = policy.retry_directive() == RetryDirective::Timed
                        && !failure.destination_mutated
                        && attempt < self.job.retry.max_attempts;

                    if !can_retry {
                        error!(
                            stage = %failure.stage,
                            error = %failure.error,
                            solution = policy.solution().unwrap_or("retry the sync"),
                            "snapshot sync failed"
                        );
                        return self.failure_report(
                            started_at,
                            staging_table,
                            failure.stage,
                            failure.error,
                        );
                    }

                    let delay = retry_delay(self.job.retry.delay_ms, attempt);
                    warn!(
                        stage = %failure.stage,
                        error = %failure.error,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "sync attempt failed, retrying from scratch"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Re-runs the rename half of the swap against a still-existing staging
    /// table.
    ///
    /// Targeted recovery for a failure between drop and rename, where the
    /// live name resolves to nothing but the loaded staging table survived.
    pub async fn resume_swap(&self) -> MirrorResult<()> {
        let staging_table =
            staging_table_name(&self.job.destination_table_name, &self.job.sync_id);

        info!(
            staging_table = %staging_table,
            destination = %self.job.destination_table_name,
            "resuming interrupted swap"
        );

        self.destination
            .rename_table(&staging_table, &self.job.destination_table_name)
            .await
    }

    async fn run_attempt(&self, staging_table: &str) -> Result<AttemptOutcome, StageFailure> {
        let job = &self.job;

        // Schema is resolved from live metadata and translated before any
        // destination mutation; an unsupported column stops the sync here.
        self.ensure_not_cancelled(SyncStage::SchemaResolved, false)?;
        let source_columns = self
            .source
            .fetch_table_columns(&job.source)
            .await
            .map_err(|error| StageFailure {
                stage: SyncStage::SchemaResolved,
                error,
                destination_mutated: false,
            })?;
        let columns = translate_columns(&source_columns).map_err(|error| StageFailure {
            stage: SyncStage::SchemaResolved,
            error,
            destination_mutated: false,
        })?;
        self.validate_index_spec(&columns)
            .map_err(|error| StageFailure {
                stage: SyncStage::SchemaResolved,
                error,
                destination_mutated: false,
            })?;
        info!(columns = columns.len(), "resolved and translated source schema");

        self.ensure_not_cancelled(SyncStage::Exported, false)?;
        let prefix = staging_prefix(&job.sync_id, &job.destination_table_name);
        let destination_uri = staging_uri(&job.staging_bucket, &prefix);
        let exported_glob = self
            .source
            .export_table(&job.source, &destination_uri)
            .await
            .map_err(|error| StageFailure {
                stage: SyncStage::Exported,
                error,
                destination_mutated: false,
            })?;

        self.ensure_not_cancelled(SyncStage::StagingLoaded, false)?;
        // Ensure the live table exists so the later drop never fails merely
        // because no prior table existed.
        self.destination
            .create_table(&job.destination_table_name, &columns, &job.index, true)
            .await
            .map_err(|error| StageFailure {
                stage: SyncStage::StagingLoaded,
                error,
                destination_mutated: false,
            })?;
        // No if-not-exists silencing here: a staging-name collision indicates
        // a naming bug, not a benign race, and must fail loudly.
        self.destination
            .create_table(staging_table, &columns, &job.index, false)
            .await
            .map_err(|error| StageFailure {
                stage: SyncStage::StagingLoaded,
                error,
                destination_mutated: true,
            })?;
        let source_url = https_url_for(&exported_glob).map_err(|error| StageFailure {
            stage: SyncStage::StagingLoaded,
            error,
            destination_mutated: true,
        })?;
        self.destination
            .load_from_url(staging_table, &source_url)
            .await
            .map_err(|error| StageFailure {
                stage: SyncStage::StagingLoaded,
                error,
                destination_mutated: true,
            })?;
        info!(staging_table, "staging table created and loaded");

        self.ensure_not_cancelled(SyncStage::Swapped, true)?;
        let swap_start = Instant::now();
        self.destination
            .drop_table(&job.destination_table_name)
            .await
            .map_err(|error| StageFailure {
                stage: SyncStage::Swapped,
                error,
                destination_mutated: true,
            })?;
        self.destination
            .rename_table(staging_table, &job.destination_table_name)
            .await
            .map_err(|error| StageFailure {
                stage: SyncStage::Swapped,
                error,
                destination_mutated: true,
            })?;
        metrics::histogram!(
            MIRROR_SWAP_DURATION_SECONDS,
            "table" => job.destination_table_name.clone()
        )
        .record(swap_start.elapsed().as_secs_f64());
        info!(
            destination = %job.destination_table_name,
            "dropped live table and renamed staging table into place"
        );

        // Cleanup only runs on the success path and its failure is soft: the
        // destination data is already correct, only storage reclamation is
        // outstanding.
        let (cleanup_succeeded, cleanup_error) = if self.is_cancelled() {
            warn!("cancellation requested after swap; staged objects are left in place");
            (
                None,
                Some(mirror_error!(
                    ErrorKind::InvalidState,
                    "Sync cancelled before cleanup",
                    format!("staged objects remain under `{destination_uri}`")
                )),
            )
        } else {
            match self.staging.delete_prefix(&job.staging_bucket, &prefix).await {
                Ok(deleted) => {
                    info!(deleted, prefix = %prefix, "deleted staged objects");
                    (Some(true), None)
                }
                Err(error) => {
                    warn!(
                        %error,
                        prefix = %prefix,
                        "cleanup failed; staged objects must be reclaimed manually"
                    );
                    (Some(false), Some(error))
                }
            }
        };

        Ok(AttemptOutcome {
            exported_glob,
            cleanup_succeeded,
            cleanup_error,
        })
    }

    /// Checks that every index column exists in the translated schema.
    ///
    /// Runs after translation and before any destination call, so a bad
    /// index spec can never shape a staging table.
    fn validate_index_spec(&self, columns: &[ColumnSchema]) -> MirrorResult<()> {
        for (index_name, index_columns) in &self.job.index {
            for column in index_columns {
                if !columns.iter().any(|c| &c.name == column) {
                    bail!(
                        ErrorKind::ConfigurationError,
                        "Index references a column the source table does not have",
                        format!("index `{index_name}` references unknown column `{column}`")
                    );
                }
            }
        }

        Ok(())
    }

    fn ensure_not_cancelled(
        &self,
        stage: SyncStage,
        destination_mutated: bool,
    ) -> Result<(), StageFailure> {
        if self.is_cancelled() {
            return Err(StageFailure {
                stage,
                error: mirror_error!(
                    ErrorKind::InvalidState,
                    "Sync cancelled",
                    format!("cancellation requested before stage {stage}")
                ),
                destination_mutated,
            });
        }

        Ok(())
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_rx.as_ref().is_some_and(is_cancelled)
    }

    fn failure_report(
        &self,
        started_at: DateTime<Utc>,
        staging_table: String,
        stage: SyncStage,
        error: MirrorError,
    ) -> SyncReport {
        SyncReport {
            success: false,
            failure_stage: Some(stage),
            source_ref: self.job.source.clone(),
            exported_glob: None,
            destination_table_name: self.job.destination_table_name.clone(),
            staging_table_name: staging_table,
            cleanup_succeeded: None,
            error: Some(error),
            started_at,
            finished_at: Utc::now(),
        }
    }
}

/// Computes the delay before retry number `attempt + 1`.
///
/// Exponential in the attempt number with a quarter of jitter on top, capped
/// at 64x the base delay.
fn retry_delay(base_ms: u64, attempt: u32) -> Duration {
    let backoff = base_ms.saturating_mul(1u64 << (attempt - 1).min(6));
    let jitter = rand::thread_rng().gen_range(0..=backoff / 4);
    Duration::from_millis(backoff.saturating_add(jitter))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_match_the_reported_strings() {
        assert_eq!(SyncStage::Pending.to_string(), "Pending");
        assert_eq!(SyncStage::SchemaResolved.to_string(), "SchemaResolved");
        assert_eq!(SyncStage::Exported.to_string(), "Exported");
        assert_eq!(SyncStage::StagingLoaded.to_string(), "StagingLoaded");
        assert_eq!(SyncStage::Swapped.to_string(), "Swapped");
        assert_eq!(SyncStage::CleanedUp.to_string(), "CleanedUp");
    }

    #[test]
    fn retry_delay_grows_with_attempts() {
        let first = retry_delay(100, 1);
        let fourth = retry_delay(100, 4);

        assert!(first >= Duration::from_millis(100));
        assert!(first <= Duration::from_millis(125));
        assert!(fourth >= Duration::from_millis(800));
        assert!(fourth <= Duration::from_millis(1000));
    }

    #[test]
    fn retry_delay_is_capped() {
        let huge = retry_delay(100, 60);
        assert!(huge <= Duration::from_millis(100 * 64 + 100 * 16));
    }
}
