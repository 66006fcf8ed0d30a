//! Error types and result definitions for sync operations.
//!
//! Provides a classified error system with captured diagnostic metadata for
//! the mirroring pipeline. [`MirrorError`] pairs a stable [`ErrorKind`] used
//! for retry decisions with a human-readable description, optional dynamic
//! detail, and the originating error where one exists.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Convenient result type for sync operations using [`MirrorError`] as the
/// error type.
pub type MirrorResult<T> = Result<T, MirrorError>;

/// Detailed payload stored inside a [`MirrorError`].
#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

/// Main error type for sync operations.
#[derive(Debug, Clone)]
pub struct MirrorError {
    payload: ErrorPayload,
}

/// Categories of errors that can occur during a sync.
///
/// The classification drives the retry policy: the pipeline never inspects
/// error messages, only kinds.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Invalid sync, index, or column specification. Raised before any I/O.
    ConfigurationError,
    /// A source column has a composite or unknown type the destination
    /// cannot represent. Raised before any destination mutation.
    UnsupportedColumnType,
    /// Schema fetch or export against the source failed. Retryable from
    /// scratch.
    SourceUnavailable,
    /// Connecting to the source failed before a request was made.
    SourceConnectionFailed,
    /// A destination-side create, load, drop, or rename failed. Retry safety
    /// depends on the stage the failure occurred in.
    DestinationError,
    /// Connecting to the destination failed before a statement was sent.
    DestinationConnectionFailed,
    /// Deleting staged objects after a successful swap failed. Non-fatal to
    /// the primary outcome, but orphaned storage is billable and must be
    /// surfaced.
    CleanupError,
    /// The pipeline was asked to do something its current state does not
    /// allow, e.g. a stage ran after cancellation.
    InvalidState,
    /// Local I/O failure.
    IoError,
    /// Uncategorized.
    Unknown,
}

impl MirrorError {
    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        self.payload.kind
    }

    /// Returns the detailed error information if available.
    pub fn detail(&self) -> Option<&str> {
        self.payload.detail.as_deref()
    }

    /// Returns the captured backtrace for this error.
    pub fn backtrace(&self) -> &Backtrace {
        self.payload.backtrace.as_ref()
    }

    /// Returns the captured callsite location for this error.
    pub fn location(&self) -> &'static Location<'static> {
        self.payload.location
    }

    /// Attaches an originating [`error::Error`] to this error and returns the
    /// modified instance. The stored source is preserved across clones and
    /// exposed via [`error::Error::source`].
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        self.payload.source = Some(Arc::new(source));
        self
    }

    /// Creates a [`MirrorError`] from its components.
    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        MirrorError {
            payload: ErrorPayload {
                kind,
                description,
                detail,
                source,
                location: Location::caller(),
                backtrace: Arc::new(Backtrace::capture()),
            },
        }
    }
}

impl PartialEq for MirrorError {
    fn eq(&self, other: &MirrorError) -> bool {
        self.payload.kind == other.payload.kind
    }
}

impl fmt::Display for MirrorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        let location = self.payload.location;
        write!(
            f,
            "[{:?}] {} @ {}:{}:{}",
            self.payload.kind,
            self.payload.description,
            location.file(),
            location.line(),
            location.column()
        )?;

        if let Some(detail) = self.payload.detail.as_deref() {
            write!(f, "\n  Detail: {detail}")?;
        }

        Ok(())
    }
}

impl error::Error for MirrorError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.payload
            .source
            .as_ref()
            .map(|source| source as &(dyn error::Error + 'static))
    }
}

/// Creates a [`MirrorError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for MirrorError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> MirrorError {
        MirrorError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

/// Creates a [`MirrorError`] from an error kind, static description, and
/// dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for MirrorError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> MirrorError {
        MirrorError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

/// Converts [`std::io::Error`] to [`MirrorError`] with [`ErrorKind::IoError`].
impl From<std::io::Error> for MirrorError {
    #[track_caller]
    fn from(err: std::io::Error) -> MirrorError {
        let detail = err.to_string();
        let source = Arc::new(err);
        MirrorError::from_components(
            ErrorKind::IoError,
            Cow::Borrowed("I/O operation failed"),
            Some(Cow::Owned(detail)),
            Some(source),
        )
    }
}

/// Converts a BigQuery client error to [`MirrorError`] with
/// [`ErrorKind::SourceUnavailable`].
///
/// BigQuery is only ever the source side of a sync, and the contract treats
/// any schema-fetch or export failure as a retryable source outage.
impl From<gcp_bigquery_client::error::BQError> for MirrorError {
    #[track_caller]
    fn from(err: gcp_bigquery_client::error::BQError) -> MirrorError {
        let detail = err.to_string();
        let source = Arc::new(err);
        MirrorError::from_components(
            ErrorKind::SourceUnavailable,
            Cow::Borrowed("BigQuery request failed"),
            Some(Cow::Owned(detail)),
            Some(source),
        )
    }
}

/// Converts an object-store error to [`MirrorError`] with
/// [`ErrorKind::CleanupError`].
///
/// The object store is only touched by staging cleanup; everything else in
/// the bucket is written and read by the source and destination engines
/// directly.
impl From<object_store::Error> for MirrorError {
    #[track_caller]
    fn from(err: object_store::Error) -> MirrorError {
        let detail = err.to_string();
        let source = Arc::new(err);
        MirrorError::from_components(
            ErrorKind::CleanupError,
            Cow::Borrowed("Staging object operation failed"),
            Some(Cow::Owned(detail)),
            Some(source),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_and_detail_are_preserved() {
        let error = MirrorError::from((
            ErrorKind::UnsupportedColumnType,
            "Column type is unsupported",
            "column `payload` has type STRUCT".to_string(),
        ));

        assert_eq!(error.kind(), ErrorKind::UnsupportedColumnType);
        assert_eq!(
            error.detail(),
            Some("column `payload` has type STRUCT")
        );
    }

    #[test]
    fn errors_compare_by_kind() {
        let a = MirrorError::from((ErrorKind::SourceUnavailable, "export failed"));
        let b = MirrorError::from((ErrorKind::SourceUnavailable, "schema fetch failed"));
        let c = MirrorError::from((ErrorKind::DestinationError, "create failed"));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn display_includes_location_and_detail() {
        let error = MirrorError::from((ErrorKind::Unknown, "something failed", "the detail"));
        let rendered = error.to_string();

        assert!(rendered.contains("[Unknown] something failed"));
        assert!(rendered.contains("Detail: the detail"));
        assert!(rendered.contains("error.rs"));
    }

    #[test]
    fn io_errors_convert_with_source() {
        let io = std::io::Error::other("disk gone");
        let error = MirrorError::from(io);

        assert_eq!(error.kind(), ErrorKind::IoError);
        assert!(std::error::Error::source(&error).is_some());
    }
}
