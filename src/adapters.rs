use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::model::{
    error::StoreError,
    object::{Credentials, EndpointConfig, ObjectHandle, ObjectSummary, UploadResult, Visibility},
};

pub mod mock;
pub mod s3;

/// Remote operations of an object store service, bound to one authenticated session.
#[async_trait]
pub trait ObjectAdapter: Send + Sync {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StoreError>;

    async fn create_bucket(&self, bucket: &str) -> Result<(), StoreError>;

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        visibility: Visibility,
    ) -> Result<UploadResult, StoreError>;

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectHandle, StoreError>;

    async fn first_object(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Option<ObjectSummary>, StoreError>;
}

/// Builds the session used by an [`ObjectAdapter`].
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        credentials: &Credentials,
        endpoint: Option<&EndpointConfig>,
    ) -> Result<Arc<dyn ObjectAdapter>, StoreError>;
}
