use std::sync::Arc;
use std::time::Instant;

use clickhouse::Client;
use secrecy::ExposeSecret;
use tracing::debug;

use config::shared::ClickHouseConnectionConfig;

use crate::destination::base::DestinationClient;
use crate::destination::metrics::{
    MIRROR_DDL_DURATION_SECONDS, MIRROR_LOAD_DURATION_SECONDS, register_metrics,
};
use crate::error::{ErrorKind, MirrorResult};
use crate::mirror_error;
use crate::types::{ColumnSchema, IndexSpec};

/// A [`DestinationClient`] backed by ClickHouse.
///
/// Wraps a [`clickhouse::Client`] and exposes the four table primitives the
/// pipeline drives the engine through. Cheaply cloneable — the inner client
/// holds an `Arc` internally, and the outer `Arc` here ensures a single
/// shared instance.
#[derive(Clone)]
pub struct ClickHouseClient {
    inner: Arc<Client>,
}

impl ClickHouseClient {
    /// Creates a new [`ClickHouseClient`].
    ///
    /// When the configured URL starts with `https://`, TLS is handled
    /// automatically by the `rustls-tls` feature using webpki root
    /// certificates.
    pub fn new(config: &ClickHouseConnectionConfig) -> MirrorResult<Self> {
        config.validate().map_err(|e| {
            mirror_error!(
                ErrorKind::ConfigurationError,
                "Invalid ClickHouse connection config",
                e
            )
        })?;

        register_metrics();

        let mut client = Client::default()
            .with_url(config.url.as_str())
            .with_user(config.user.as_str())
            .with_database(config.database.as_str());

        if let Some(password) = &config.password {
            client = client.with_password(password.expose_secret());
        }

        Ok(Self {
            inner: Arc::new(client),
        })
    }

    pub async fn ping(&self) -> MirrorResult<()> {
        self.inner
            .query("SELECT 1")
            .fetch_one::<u8>()
            .await
            .map(|_| ())
            .map_err(|e| {
                mirror_error!(
                    ErrorKind::DestinationConnectionFailed,
                    "ClickHouse connectivity check failed",
                    e
                )
            })
    }

    /// Executes a DDL statement (e.g. `CREATE TABLE IF NOT EXISTS …`).
    async fn execute_ddl(&self, sql: &str, table_name: &str) -> MirrorResult<()> {
        let ddl_start = Instant::now();
        self.inner.query(sql).execute().await.map_err(|e| {
            mirror_error!(
                ErrorKind::DestinationError,
                "ClickHouse DDL failed",
                format!("DDL execution failed for `{table_name}`: {e}")
            )
        })?;
        metrics::histogram!(MIRROR_DDL_DURATION_SECONDS, "table" => table_name.to_string())
            .record(ddl_start.elapsed().as_secs_f64());

        Ok(())
    }
}

/// Generates the `CREATE TABLE` statement for the given columns and indexes.
///
/// - Columns use the already-translated destination types, in source order.
/// - Indexes render as data-skipping `INDEX` clauses in spec order.
/// - The table uses `MergeTree()` with `ORDER BY tuple()` (pure append
///   order).
pub fn build_create_table_sql(
    table_name: &str,
    columns: &[ColumnSchema],
    indexes: &IndexSpec,
    if_not_exists: bool,
) -> String {
    let mut clauses = Vec::with_capacity(columns.len() + indexes.len());

    for column in columns {
        clauses.push(format!("  \"{}\" {}", column.name, column.dest_type));
    }

    for (index_name, index_columns) in indexes {
        let quoted = index_columns
            .iter()
            .map(|c| format!("\"{c}\""))
            .collect::<Vec<_>>()
            .join(", ");
        clauses.push(format!(
            "  INDEX {index_name} ({quoted}) TYPE minmax GRANULARITY 1"
        ));
    }

    let if_not_exists = if if_not_exists { "IF NOT EXISTS " } else { "" };
    let body = clauses.join(",\n");

    format!(
        "CREATE TABLE {if_not_exists}\"{table_name}\" (\n{body}\n) ENGINE = MergeTree()\nORDER BY tuple()"
    )
}

impl DestinationClient for ClickHouseClient {
    async fn create_table(
        &self,
        name: &str,
        columns: &[ColumnSchema],
        indexes: &IndexSpec,
        if_not_exists: bool,
    ) -> MirrorResult<()> {
        let sql = build_create_table_sql(name, columns, indexes, if_not_exists);
        debug!(table = name, if_not_exists, "creating table");
        self.execute_ddl(&sql, name).await
    }

    async fn load_from_url(&self, name: &str, source_url: &str) -> MirrorResult<()> {
        let sql = format!("INSERT INTO \"{name}\" SELECT * FROM s3('{source_url}', 'Parquet')");

        let load_start = Instant::now();
        self.inner.query(&sql).execute().await.map_err(|e| {
            mirror_error!(
                ErrorKind::DestinationError,
                "ClickHouse bulk load failed",
                format!("Failed to load `{source_url}` into `{name}`: {e}")
            )
        })?;
        metrics::histogram!(MIRROR_LOAD_DURATION_SECONDS, "table" => name.to_string())
            .record(load_start.elapsed().as_secs_f64());

        Ok(())
    }

    async fn drop_table(&self, name: &str) -> MirrorResult<()> {
        self.execute_ddl(&format!("DROP TABLE \"{name}\""), name).await
    }

    async fn rename_table(&self, old_name: &str, new_name: &str) -> MirrorResult<()> {
        self.execute_ddl(
            &format!("RENAME TABLE \"{old_name}\" TO \"{new_name}\""),
            new_name,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SourceType, IndexSpec};

    fn columns() -> Vec<ColumnSchema> {
        vec![
            ColumnSchema {
                name: "id".to_string(),
                source_type: SourceType::Int64,
                dest_type: "Int64",
            },
            ColumnSchema {
                name: "name".to_string(),
                source_type: SourceType::String,
                dest_type: "String",
            },
        ]
    }

    #[test]
    fn create_table_sql_renders_columns_in_order() {
        let sql = build_create_table_sql("events", &columns(), &IndexSpec::new(), false);

        assert!(sql.starts_with("CREATE TABLE \"events\""));
        assert!(sql.contains("\"id\" Int64"));
        assert!(sql.contains("\"name\" String"));
        assert!(sql.find("\"id\"").unwrap() < sql.find("\"name\"").unwrap());
        assert!(sql.contains("ENGINE = MergeTree()"));
        assert!(sql.contains("ORDER BY tuple()"));
    }

    #[test]
    fn create_table_sql_honors_if_not_exists() {
        let sql = build_create_table_sql("events", &columns(), &IndexSpec::new(), true);
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS \"events\""));

        let sql = build_create_table_sql("events", &columns(), &IndexSpec::new(), false);
        assert!(!sql.contains("IF NOT EXISTS"));
    }

    #[test]
    fn create_table_sql_renders_index_clauses() {
        let mut indexes = IndexSpec::new();
        indexes.insert("idx_name".to_string(), vec!["name".to_string(), "id".to_string()]);

        let sql = build_create_table_sql("events", &columns(), &indexes, true);
        assert!(sql.contains("INDEX idx_name (\"name\", \"id\") TYPE minmax GRANULARITY 1"));
    }
}
