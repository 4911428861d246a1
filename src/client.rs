use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::OnceCell;
use tracing::{error, info, instrument};

use crate::{
    adapters::{self, s3::S3Connector},
    model::{
        error::StoreError,
        object::{Credentials, EndpointConfig, ObjectHandle, ObjectSummary, UploadResult, UploadSpec},
    },
    util,
};

/// The operations offered on top of an object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Creates `bucket` unless it already exists.
    ///
    /// Two callers racing on a missing bucket may both try to create it; the
    /// loser sees the provider's conflict as [`StoreError::Provider`].
    async fn ensure_bucket(&self, bucket: &str) -> Result<(), StoreError>;

    async fn upload(&self, spec: &UploadSpec) -> Result<UploadResult, StoreError>;

    async fn download(&self, bucket: &str, key: &str) -> Result<ObjectHandle, StoreError>;

    fn resource_url(&self, bucket: &str, key: &str) -> Result<String, StoreError>;

    /// First object under `prefix`, in the service's listing order.
    async fn exists_by_prefix(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Option<ObjectSummary>, StoreError>;
}

/// Object store client whose connection is built on first use and then reused
/// by every operation, concurrent ones included.
pub struct ObjectStoreClient {
    credentials: Credentials,
    endpoint: Option<EndpointConfig>,
    connector: Arc<dyn adapters::Connector>,
    connection: OnceCell<Arc<dyn adapters::ObjectAdapter>>,
}

impl ObjectStoreClient {
    /// Client backed by the AWS SDK. Nothing is contacted until the first operation.
    pub fn new(credentials: Credentials, endpoint: Option<EndpointConfig>) -> Self {
        Self::with_connector(credentials, endpoint, Arc::new(S3Connector::default()))
    }

    pub fn with_connector(
        credentials: Credentials,
        endpoint: Option<EndpointConfig>,
        connector: Arc<dyn adapters::Connector>,
    ) -> Self {
        Self {
            credentials,
            endpoint,
            connector,
            connection: OnceCell::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.initialized()
    }

    // A failed connect leaves the cell empty so the next call tries again.
    async fn connection(&self) -> Result<&Arc<dyn adapters::ObjectAdapter>, StoreError> {
        self.connection
            .get_or_try_init(|| async {
                info!(access_key_id = self.credentials.access_key_id(), "connecting");
                self.connector
                    .connect(&self.credentials, self.endpoint.as_ref())
                    .await
                    .inspect_err(|err| {
                        error!(error_message=%err, error_group="connect");
                    })
            })
            .await
    }

    async fn ensure_bucket_on(
        conn: &Arc<dyn adapters::ObjectAdapter>,
        bucket: &str,
    ) -> Result<(), StoreError> {
        if conn.bucket_exists(bucket).await? {
            return Ok(());
        }

        info!(bucket = bucket, "creating bucket");
        conn.create_bucket(bucket).await
    }
}

#[async_trait]
impl ObjectStore for ObjectStoreClient {
    #[instrument(skip(self), fields(context = "ensure_bucket"))]
    async fn ensure_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        info!("called");

        let conn = self.connection().await?;
        Self::ensure_bucket_on(conn, bucket)
            .await
            .inspect_err(|err| error!(error_message=%err, error_group=err.group()))
    }

    #[instrument(skip(self, spec), fields(context = "upload", locator = %spec.locator))]
    async fn upload(&self, spec: &UploadSpec) -> Result<UploadResult, StoreError> {
        info!(path = %spec.path.display(), public = spec.visibility.is_public(), "called");

        let body = tokio::fs::read(&spec.path).await.map_err(|err| {
            let err = StoreError::local_io(&spec.path, err);
            error!(error_message=%err, error_group=err.group());
            err
        })?;

        let conn = self.connection().await?;
        let bucket = &spec.locator.bucket;

        let res = async {
            Self::ensure_bucket_on(conn, bucket).await?;
            conn.put_object(bucket, &spec.locator.key, Bytes::from(body), spec.visibility)
                .await
        }
        .await
        .inspect_err(|err| error!(error_message=%err, error_group=err.group()))?;

        info!(e_tag = ?res.e_tag, "uploaded");
        Ok(res)
    }

    #[instrument(skip(self), fields(context = "download"))]
    async fn download(&self, bucket: &str, key: &str) -> Result<ObjectHandle, StoreError> {
        info!("called");

        let conn = self.connection().await?;
        conn.get_object(bucket, key)
            .await
            .inspect_err(|err| error!(error_message=%err, error_group=err.group()))
    }

    fn resource_url(&self, bucket: &str, key: &str) -> Result<String, StoreError> {
        util::url::resource_url(self.endpoint.as_ref(), bucket, key)
    }

    #[instrument(skip(self), fields(context = "exists_by_prefix"))]
    async fn exists_by_prefix(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Option<ObjectSummary>, StoreError> {
        info!("called");

        let conn = self.connection().await?;
        conn.first_object(bucket, prefix)
            .await
            .inspect_err(|err| error!(error_message=%err, error_group=err.group()))
    }
}
