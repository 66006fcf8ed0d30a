use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// `sync_id` cannot be empty.
    #[error("`sync_id` cannot be empty")]
    SyncIdEmpty,
    /// The destination table name is not a valid identifier.
    #[error("`destination_table_name` `{0}` is not a valid identifier")]
    DestinationTableNameInvalid(String),
    /// The staging bucket cannot be empty.
    #[error("`staging_bucket` cannot be empty")]
    StagingBucketEmpty,
    /// A field of the source table reference is empty.
    #[error("source table reference field `{0}` cannot be empty")]
    SourceTableRefFieldEmpty(&'static str),
    /// An index maps to an empty column list or carries an invalid name.
    #[error("Invalid index spec: {0}")]
    IndexSpecInvalid(String),
    /// Maximum retry attempts cannot be zero.
    #[error("`retry.max_attempts` cannot be zero")]
    RetryMaxAttemptsZero,
    /// Invalid ClickHouse connection settings.
    #[error("Invalid ClickHouse connection config: {0}")]
    ClickHouseConnectionInvalid(String),
}
