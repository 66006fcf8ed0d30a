use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::destination::base::DestinationClient;
use crate::error::{ErrorKind, MirrorResult};
use crate::mirror_error;
use crate::source::base::SourceClient;
use crate::staging::base::StagingStore;
use crate::types::{ColumnSchema, IndexSpec, SourceColumn, SourceTableRef};

/// In-memory stand-in for the staging bucket, shared between the stub source
/// (which writes shards on export) and the stub staging store (which deletes
/// them on cleanup).
#[derive(Debug, Default)]
pub struct StubBucket {
    objects: Mutex<BTreeSet<String>>,
}

impl StubBucket {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn objects(&self) -> Vec<String> {
        self.objects.lock().unwrap().iter().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.lock().unwrap().is_empty()
    }

    pub fn objects_under(&self, prefix: &str) -> usize {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.starts_with(prefix))
            .count()
    }
}

/// Stub source that serves a fixed column list and "exports" a couple of
/// shard objects into the shared [`StubBucket`].
#[derive(Clone)]
pub struct StubSource {
    columns: Vec<SourceColumn>,
    bucket: Arc<StubBucket>,
    fail_export: bool,
    schema_calls: Arc<AtomicUsize>,
    export_calls: Arc<AtomicUsize>,
}

impl StubSource {
    pub fn new(columns: Vec<SourceColumn>, bucket: Arc<StubBucket>) -> Self {
        Self {
            columns,
            bucket,
            fail_export: false,
            schema_calls: Arc::new(AtomicUsize::new(0)),
            export_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Makes every export attempt fail with a retryable source error.
    pub fn failing_export(mut self) -> Self {
        self.fail_export = true;
        self
    }

    pub fn schema_calls(&self) -> usize {
        self.schema_calls.load(Ordering::SeqCst)
    }

    pub fn export_calls(&self) -> usize {
        self.export_calls.load(Ordering::SeqCst)
    }
}

impl SourceClient for StubSource {
    async fn fetch_table_columns(
        &self,
        _table: &SourceTableRef,
    ) -> MirrorResult<Vec<SourceColumn>> {
        self.schema_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.columns.clone())
    }

    async fn export_table(
        &self,
        _table: &SourceTableRef,
        destination_uri: &str,
    ) -> MirrorResult<String> {
        self.export_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_export {
            return Err(mirror_error!(
                ErrorKind::SourceUnavailable,
                "Export job failed",
                "stubbed export failure"
            ));
        }

        // Strip `gs://bucket/` so bucket contents are keyed by relative path,
        // matching what the staging store's prefix deletes operate on.
        let prefix = destination_uri
            .strip_prefix("gs://")
            .and_then(|rest| rest.split_once('/'))
            .map(|(_, path)| path)
            .unwrap_or(destination_uri);

        let mut objects = self.bucket.objects.lock().unwrap();
        for shard in 0..2 {
            objects.insert(format!("{prefix}/{shard:012}.parquet"));
        }

        Ok(format!("{destination_uri}/*.parquet"))
    }
}

/// State of one stub destination table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableState {
    pub columns: Vec<ColumnSchema>,
    /// URL the table was bulk-loaded from; [`None`] for an empty table.
    pub loaded_from: Option<String>,
}

impl TableState {
    pub fn empty(columns: Vec<ColumnSchema>) -> Self {
        Self {
            columns,
            loaded_from: None,
        }
    }
}

/// Stub destination keeping an in-memory table registry with the same
/// create/load/drop/rename semantics the pipeline relies on, plus a total
/// call counter for the no-calls-after-translation-failure property.
#[derive(Clone, Default)]
pub struct StubDestination {
    tables: Arc<Mutex<BTreeMap<String, TableState>>>,
    calls: Arc<AtomicUsize>,
    fail_load: bool,
    fail_drop: bool,
    fail_rename: bool,
}

impl StubDestination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every bulk load fail.
    pub fn failing_load(mut self) -> Self {
        self.fail_load = true;
        self
    }

    /// Makes every drop fail.
    pub fn failing_drop(mut self) -> Self {
        self.fail_drop = true;
        self
    }

    /// Makes every rename fail, which strands the sync inside the swap
    /// window after a successful drop.
    pub fn failing_rename(mut self) -> Self {
        self.fail_rename = true;
        self
    }

    /// Returns a handle to the same table registry with every failure
    /// injection cleared, standing in for the engine after a transient fault
    /// has passed.
    pub fn recovered(&self) -> StubDestination {
        StubDestination {
            tables: Arc::clone(&self.tables),
            calls: Arc::clone(&self.calls),
            fail_load: false,
            fail_drop: false,
            fail_rename: false,
        }
    }

    /// Pre-creates a table, standing in for data left by a previous sync.
    pub fn seed_table(&self, name: &str, state: TableState) {
        self.tables
            .lock()
            .unwrap()
            .insert(name.to_string(), state);
    }

    /// Total number of destination calls issued, across all four primitives.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn table(&self, name: &str) -> Option<TableState> {
        self.tables.lock().unwrap().get(name).cloned()
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.lock().unwrap().contains_key(name)
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.lock().unwrap().keys().cloned().collect()
    }
}

impl DestinationClient for StubDestination {
    async fn create_table(
        &self,
        name: &str,
        columns: &[ColumnSchema],
        _indexes: &IndexSpec,
        if_not_exists: bool,
    ) -> MirrorResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut tables = self.tables.lock().unwrap();
        if tables.contains_key(name) {
            if if_not_exists {
                return Ok(());
            }
            return Err(mirror_error!(
                ErrorKind::DestinationError,
                "Table already exists",
                name
            ));
        }

        tables.insert(name.to_string(), TableState::empty(columns.to_vec()));
        Ok(())
    }

    async fn load_from_url(&self, name: &str, source_url: &str) -> MirrorResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_load {
            return Err(mirror_error!(
                ErrorKind::DestinationError,
                "ClickHouse bulk load failed",
                "stubbed load failure"
            ));
        }

        let mut tables = self.tables.lock().unwrap();
        let Some(table) = tables.get_mut(name) else {
            return Err(mirror_error!(
                ErrorKind::DestinationError,
                "Table does not exist",
                name
            ));
        };
        table.loaded_from = Some(source_url.to_string());

        Ok(())
    }

    async fn drop_table(&self, name: &str) -> MirrorResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_drop {
            return Err(mirror_error!(
                ErrorKind::DestinationError,
                "ClickHouse DDL failed",
                "stubbed drop failure"
            ));
        }

        if self.tables.lock().unwrap().remove(name).is_none() {
            return Err(mirror_error!(
                ErrorKind::DestinationError,
                "Table does not exist",
                name
            ));
        }

        Ok(())
    }

    async fn rename_table(&self, old_name: &str, new_name: &str) -> MirrorResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_rename {
            return Err(mirror_error!(
                ErrorKind::DestinationError,
                "ClickHouse DDL failed",
                "stubbed rename failure"
            ));
        }

        let mut tables = self.tables.lock().unwrap();
        if tables.contains_key(new_name) {
            return Err(mirror_error!(
                ErrorKind::DestinationError,
                "Rename target already exists",
                new_name
            ));
        }
        let Some(state) = tables.remove(old_name) else {
            return Err(mirror_error!(
                ErrorKind::DestinationError,
                "Table does not exist",
                old_name
            ));
        };
        tables.insert(new_name.to_string(), state);

        Ok(())
    }
}

/// Stub staging store deleting objects from the shared [`StubBucket`].
#[derive(Clone)]
pub struct StubStaging {
    bucket: Arc<StubBucket>,
    fail_delete: bool,
    delete_calls: Arc<AtomicUsize>,
}

impl StubStaging {
    pub fn new(bucket: Arc<StubBucket>) -> Self {
        Self {
            bucket,
            fail_delete: false,
            delete_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Makes every prefix delete fail.
    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }
}

impl StagingStore for StubStaging {
    async fn delete_prefix(&self, _bucket: &str, prefix: &str) -> MirrorResult<usize> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_delete {
            return Err(mirror_error!(
                ErrorKind::CleanupError,
                "Staging object operation failed",
                "stubbed delete failure"
            ));
        }

        let mut objects = self.bucket.objects.lock().unwrap();
        let to_delete: Vec<String> = objects
            .iter()
            .filter(|o| o.starts_with(prefix))
            .cloned()
            .collect();
        for object in &to_delete {
            objects.remove(object);
        }

        Ok(to_delete.len())
    }
}
