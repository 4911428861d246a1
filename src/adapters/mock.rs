use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::{Duration, SystemTime},
};

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;

use crate::{
    adapters,
    model::{
        error::StoreError,
        object::{
            Credentials, EndpointConfig, ObjectHandle, ObjectLocator, ObjectSummary, UploadResult,
            Visibility,
        },
    },
};

#[derive(Clone, Debug)]
struct MockObject {
    body: Bytes,
    e_tag: String,
    visibility: Visibility,
    modified_time: SystemTime,
}

#[derive(Debug, Default)]
pub struct MockCalls {
    pub bucket_exists: AtomicUsize,
    pub create_bucket: AtomicUsize,
    pub put_object: AtomicUsize,
    pub get_object: AtomicUsize,
    pub first_object: AtomicUsize,
}

impl MockCalls {
    pub fn total(&self) -> usize {
        self.bucket_exists.load(Ordering::SeqCst)
            + self.create_bucket.load(Ordering::SeqCst)
            + self.put_object.load(Ordering::SeqCst)
            + self.get_object.load(Ordering::SeqCst)
            + self.first_object.load(Ordering::SeqCst)
    }
}

/// In-memory object store. Keys list in lexicographic order, like S3.
#[derive(Debug, Default)]
pub struct MockClient {
    buckets: Mutex<HashMap<String, BTreeMap<String, MockObject>>>,
    pub calls: MockCalls,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket(self, bucket: &str) -> Self {
        self.buckets().entry(bucket.to_string()).or_default();
        self
    }

    pub fn with_object(self, bucket: &str, key: &str, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        self.buckets()
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), stored(body, Visibility::Private));
        self
    }

    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.buckets().contains_key(bucket)
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.buckets()
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|o| o.body.clone())
    }

    pub fn visibility(&self, bucket: &str, key: &str) -> Option<Visibility> {
        self.buckets()
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|o| o.visibility)
    }

    fn buckets(&self) -> MutexGuard<'_, HashMap<String, BTreeMap<String, MockObject>>> {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn stored(body: Bytes, visibility: Visibility) -> MockObject {
    MockObject {
        e_tag: format!("\"{:x}\"", md5::compute(&body)),
        body,
        visibility,
        modified_time: SystemTime::now(),
    }
}

fn no_such_bucket(bucket: &str) -> StoreError {
    StoreError::NotFound {
        message: format!("no such bucket: {}", bucket),
    }
}

#[async_trait]
impl adapters::ObjectAdapter for MockClient {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StoreError> {
        self.calls.bucket_exists.fetch_add(1, Ordering::SeqCst);
        Ok(self.has_bucket(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        self.calls.create_bucket.fetch_add(1, Ordering::SeqCst);

        let mut buckets = self.buckets();
        if buckets.contains_key(bucket) {
            return Err(StoreError::Provider {
                status: Some(409),
                code: Some("BucketAlreadyOwnedByYou".to_string()),
                message: format!("failed to create_bucket: {}", bucket),
            });
        }

        buckets.insert(bucket.to_string(), BTreeMap::new());
        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        visibility: Visibility,
    ) -> Result<UploadResult, StoreError> {
        self.calls.put_object.fetch_add(1, Ordering::SeqCst);

        let mut buckets = self.buckets();
        let objects = buckets.get_mut(bucket).ok_or_else(|| no_such_bucket(bucket))?;

        let object = stored(body, visibility);
        let e_tag = object.e_tag.clone();
        objects.insert(key.to_string(), object);

        Ok(UploadResult {
            locator: ObjectLocator::new(bucket, key),
            e_tag: Some(e_tag),
            version_id: None,
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectHandle, StoreError> {
        self.calls.get_object.fetch_add(1, Ordering::SeqCst);

        let buckets = self.buckets();
        let objects = buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        let object = objects.get(key).ok_or_else(|| StoreError::NotFound {
            message: format!("no such key: {}", key),
        })?;

        Ok(ObjectHandle::new(
            ObjectLocator::new(bucket, key),
            ByteStream::from(object.body.clone()),
        )
        .with_e_tag(Some(object.e_tag.clone()))
        .with_content_length(Some(object.body.len() as i64)))
    }

    async fn first_object(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Option<ObjectSummary>, StoreError> {
        self.calls.first_object.fetch_add(1, Ordering::SeqCst);

        let buckets = self.buckets();
        let objects = buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;

        let first = objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .next()
            .map(|(key, o)| ObjectSummary {
                key: key.clone(),
                e_tag: Some(o.e_tag.clone()),
                size: o.body.len() as i64,
                modified_time: Some(o.modified_time),
            });

        Ok(first)
    }
}

/// Hands out a shared [`MockClient`] and counts how often it was asked to.
#[derive(Debug)]
pub struct MockConnector {
    client: Arc<MockClient>,
    connects: AtomicUsize,
    refusals: AtomicUsize,
    delay: Option<Duration>,
}

impl MockConnector {
    pub fn new(client: Arc<MockClient>) -> Self {
        Self {
            client,
            connects: AtomicUsize::new(0),
            refusals: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Rejects the next `refusals` connects as bad credentials.
    pub fn with_refusals(self, refusals: usize) -> Self {
        self.refusals.store(refusals, Ordering::SeqCst);
        self
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl adapters::Connector for MockConnector {
    async fn connect(
        &self,
        _credentials: &Credentials,
        _endpoint: Option<&EndpointConfig>,
    ) -> Result<Arc<dyn adapters::ObjectAdapter>, StoreError> {
        self.connects.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let refused = self
            .refusals
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(StoreError::Authentication {
                message: "InvalidAccessKeyId".to_string(),
            });
        }

        Ok(self.client.clone())
    }
}
