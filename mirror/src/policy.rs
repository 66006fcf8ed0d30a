use crate::error::{ErrorKind, MirrorError};

/// Retry behavior for a classified error.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RetryDirective {
    /// The sync can be retried automatically with pipeline-defined timing.
    Timed,
    /// The sync should only be retried after manual intervention.
    Manual,
    /// The sync should not be retried.
    NoRetry,
}

/// Policy describing how a [`MirrorError`] should be handled by the pipeline.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ErrorHandlingPolicy {
    retry_directive: RetryDirective,
    solution: Option<&'static str>,
}

impl ErrorHandlingPolicy {
    const fn new(retry_directive: RetryDirective, solution: Option<&'static str>) -> Self {
        Self {
            retry_directive,
            solution,
        }
    }

    /// Returns the retry directive for this policy.
    pub fn retry_directive(&self) -> RetryDirective {
        self.retry_directive
    }

    /// Returns an optional operator-facing solution message.
    pub fn solution(&self) -> Option<&'static str> {
        self.solution
    }
}

/// Builds an [`ErrorHandlingPolicy`] from a [`MirrorError`] so errors are
/// handled in one auditable place.
///
/// The directive is necessary but not sufficient for an automatic retry: the
/// pipeline additionally requires that the failed attempt had not yet begun
/// mutating the destination, so a left-behind staging table is never
/// clobbered by a blind re-run.
pub fn build_error_handling_policy(error: &MirrorError) -> ErrorHandlingPolicy {
    match error.kind() {
        // Transient outages of either engine, expected to recover without
        // operator intervention.
        ErrorKind::SourceUnavailable
        | ErrorKind::SourceConnectionFailed
        | ErrorKind::DestinationConnectionFailed => {
            ErrorHandlingPolicy::new(RetryDirective::Timed, None)
        }

        // Destination statements may fail transiently too, but whether a
        // re-run is safe depends on how far the attempt got; the pipeline
        // gates this directive on the stage.
        ErrorKind::DestinationError => ErrorHandlingPolicy::new(RetryDirective::Timed, None),

        // Retrying an invalid configuration or an unsupported schema cannot
        // succeed until the input changes.
        ErrorKind::ConfigurationError => ErrorHandlingPolicy::new(
            RetryDirective::NoRetry,
            Some("Fix the sync job configuration before re-running."),
        ),
        ErrorKind::UnsupportedColumnType => ErrorHandlingPolicy::new(
            RetryDirective::NoRetry,
            Some(
                "Drop or flatten the unsupported column in the source table, or exclude the table from mirroring.",
            ),
        ),

        // The destination data is already correct; only storage reclamation
        // is outstanding.
        ErrorKind::CleanupError => ErrorHandlingPolicy::new(
            RetryDirective::Manual,
            Some("Delete the staged objects under the sync's staging prefix to stop paying for them."),
        ),

        _ => ErrorHandlingPolicy::new(
            RetryDirective::Manual,
            Some(
                "Inspect the failure stage in the sync report; the staging table and staged objects are left in place for diagnosis.",
            ),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn err(kind: ErrorKind) -> MirrorError {
        MirrorError::from((kind, "test error"))
    }

    #[test]
    fn classifies_source_unavailable_as_timed_retry() {
        let policy = build_error_handling_policy(&err(ErrorKind::SourceUnavailable));
        assert_eq!(policy.retry_directive(), RetryDirective::Timed);
        assert_eq!(policy.solution(), None);
    }

    #[test]
    fn classifies_unsupported_column_type_as_no_retry() {
        let policy = build_error_handling_policy(&err(ErrorKind::UnsupportedColumnType));
        assert_eq!(policy.retry_directive(), RetryDirective::NoRetry);
        assert!(policy.solution().is_some());
    }

    #[test]
    fn classifies_cleanup_error_as_manual() {
        let policy = build_error_handling_policy(&err(ErrorKind::CleanupError));
        assert_eq!(policy.retry_directive(), RetryDirective::Manual);
        assert!(policy.solution().is_some());
    }

    #[test]
    fn classifies_unknown_kind_as_manual() {
        let policy = build_error_handling_policy(&err(ErrorKind::InvalidState));
        assert_eq!(policy.retry_directive(), RetryDirective::Manual);
        assert!(policy.solution().is_some());
    }
}
