use futures::StreamExt;
use object_store::ObjectStore;
use object_store::gcp::{GoogleCloudStorage, GoogleCloudStorageBuilder};
use object_store::path::Path as ObjectPath;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use config::shared::GcpCredentialsConfig;

use crate::error::MirrorResult;
use crate::staging::base::StagingStore;

/// A [`StagingStore`] backed by Google Cloud Storage.
///
/// Holds the service account key and builds a bucket-scoped store per call;
/// syncs targeting different buckets can share one instance.
pub struct GcsStagingStore {
    service_account_key: SecretString,
}

impl GcsStagingStore {
    /// Creates a new [`GcsStagingStore`] from a service account key.
    pub fn new(credentials: &GcpCredentialsConfig) -> Self {
        Self {
            service_account_key: credentials.service_account_key.clone(),
        }
    }

    fn bucket_store(&self, bucket: &str) -> MirrorResult<GoogleCloudStorage> {
        let store = GoogleCloudStorageBuilder::new()
            .with_bucket_name(bucket)
            .with_service_account_key(self.service_account_key.expose_secret())
            .build()?;

        Ok(store)
    }
}

impl StagingStore for GcsStagingStore {
    async fn delete_prefix(&self, bucket: &str, prefix: &str) -> MirrorResult<usize> {
        let store = self.bucket_store(bucket)?;
        let prefix = ObjectPath::from(prefix);

        let mut objects = store.list(Some(&prefix));
        let mut deleted = 0usize;
        while let Some(meta) = objects.next().await {
            let meta = meta?;
            store.delete(&meta.location).await?;
            deleted += 1;
        }

        debug!(bucket, %prefix, deleted, "deleted staged objects");

        Ok(deleted)
    }
}
