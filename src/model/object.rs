use std::{fmt, path::PathBuf, time::SystemTime};

use aws_sdk_s3::primitives::ByteStream;
use bytes::{Bytes, BytesMut};
use tokio::io::AsyncWriteExt;

use crate::model::error::StoreError;

/// Static access key pair used to sign every request of a client.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
}

impl Credentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .finish()
    }
}

/// Where requests go. Without one the client talks to the public AWS endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EndpointConfig {
    pub use_custom_endpoint: bool,
    pub endpoint_url: Option<String>,
    pub region: Option<String>,
}

impl EndpointConfig {
    pub fn custom(endpoint_url: impl Into<String>, region: Option<String>) -> Self {
        Self {
            use_custom_endpoint: true,
            endpoint_url: Some(endpoint_url.into()),
            region,
        }
    }

    pub fn region(region: impl Into<String>) -> Self {
        Self {
            use_custom_endpoint: false,
            endpoint_url: None,
            region: Some(region.into()),
        }
    }

    /// The endpoint url, only when the custom endpoint flag is set.
    pub fn custom_endpoint(&self) -> Result<Option<&str>, StoreError> {
        if !self.use_custom_endpoint {
            return Ok(None);
        }

        match self.endpoint_url.as_deref() {
            Some(url) if !url.trim().is_empty() => Ok(Some(url)),
            _ => Err(StoreError::Config(
                "custom endpoint enabled without an endpoint url".to_string(),
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectLocator {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocator {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ObjectLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Canned access policy applied to an object when it is written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Visibility {
    PublicRead,
    #[default]
    Private,
}

impl Visibility {
    pub fn from_public(is_public: bool) -> Self {
        if is_public {
            Visibility::PublicRead
        } else {
            Visibility::Private
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Visibility::PublicRead)
    }
}

#[derive(Clone, Debug)]
pub struct UploadSpec {
    pub locator: ObjectLocator,
    pub path: PathBuf,
    pub visibility: Visibility,
}

impl UploadSpec {
    pub fn new(
        bucket: impl Into<String>,
        key: impl Into<String>,
        path: impl Into<PathBuf>,
        is_public: bool,
    ) -> Self {
        Self {
            locator: ObjectLocator::new(bucket, key),
            path: path.into(),
            visibility: Visibility::from_public(is_public),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadResult {
    pub locator: ObjectLocator,
    pub e_tag: Option<String>,
    pub version_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub e_tag: Option<String>,
    pub size: i64,
    pub modified_time: Option<SystemTime>,
}

/// A downloaded object. The body is owned by the holder and its transport
/// resources are released once it is consumed or dropped.
#[derive(Debug)]
pub struct ObjectHandle {
    pub locator: ObjectLocator,
    pub e_tag: Option<String>,
    pub content_length: Option<i64>,
    pub content_type: Option<String>,
    body: ByteStream,
}

impl ObjectHandle {
    pub fn new(locator: ObjectLocator, body: ByteStream) -> Self {
        Self {
            locator,
            e_tag: None,
            content_length: None,
            content_type: None,
            body,
        }
    }

    pub fn with_e_tag(mut self, e_tag: Option<String>) -> Self {
        self.e_tag = e_tag;
        self
    }

    pub fn with_content_length(mut self, content_length: Option<i64>) -> Self {
        self.content_length = content_length;
        self
    }

    pub fn with_content_type(mut self, content_type: Option<String>) -> Self {
        self.content_type = content_type;
        self
    }

    pub async fn into_bytes(mut self) -> Result<Bytes, StoreError> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.next_chunk().await? {
            buf.extend_from_slice(&chunk);
        }

        Ok(buf.freeze())
    }

    /// Streams the body into a local file, returning the number of bytes written.
    pub async fn write_to(mut self, path: impl Into<PathBuf>) -> Result<u64, StoreError> {
        let path = path.into();
        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|err| StoreError::local_io(&path, err))?;

        let mut written = 0u64;
        while let Some(chunk) = self.next_chunk().await? {
            file.write_all(&chunk)
                .await
                .map_err(|err| StoreError::local_io(&path, err))?;
            written += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|err| StoreError::local_io(&path, err))?;

        Ok(written)
    }

    async fn next_chunk(&mut self) -> Result<Option<Bytes>, StoreError> {
        self.body
            .try_next()
            .await
            .map_err(|err| StoreError::Connectivity {
                message: format!("failed to read body of: {}, {}", self.locator, err),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let creds = Credentials::new("AKIAEXAMPLE", "very-secret");
        let out = format!("{:?}", creds);

        assert!(out.contains("AKIAEXAMPLE"));
        assert!(!out.contains("very-secret"));
    }

    #[test]
    fn test_custom_endpoint() {
        let cases = vec![
            (EndpointConfig::default(), Some(None)),
            (EndpointConfig::region("eu-west-1"), Some(None)),
            (
                EndpointConfig::custom("http://localhost:9000", None),
                Some(Some("http://localhost:9000")),
            ),
            (
                EndpointConfig {
                    use_custom_endpoint: true,
                    endpoint_url: None,
                    region: None,
                },
                None,
            ),
            (
                EndpointConfig {
                    use_custom_endpoint: false,
                    endpoint_url: Some("http://ignored:9000".to_string()),
                    region: None,
                },
                Some(None),
            ),
        ];

        for (config, expected) in cases {
            let result = config.custom_endpoint();
            match expected {
                Some(url) => assert_eq!(result.ok(), Some(url), "failed for case: {:?}", config),
                None => assert!(
                    matches!(result, Err(StoreError::Config(_))),
                    "failed for case: {:?}",
                    config
                ),
            }
        }
    }

    #[test]
    fn test_visibility() {
        assert_eq!(Visibility::from_public(true), Visibility::PublicRead);
        assert_eq!(Visibility::from_public(false), Visibility::Private);
        assert!(Visibility::PublicRead.is_public());
        assert!(!Visibility::default().is_public());
    }

    #[test]
    fn test_locator_display() {
        assert_eq!(
            ObjectLocator::new("gmax", "dir/files").to_string(),
            "s3://gmax/dir/files"
        );
    }

    #[tokio::test]
    async fn test_handle_into_bytes() {
        let handle = ObjectHandle::new(
            ObjectLocator::new("gmax", "files"),
            ByteStream::from(Bytes::from_static(b"hello world")),
        );

        let bytes = handle.into_bytes().await.unwrap();
        assert_eq!(&bytes[..], b"hello world");
    }

    #[tokio::test]
    async fn test_handle_write_to() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let handle = ObjectHandle::new(
            ObjectLocator::new("gmax", "files"),
            ByteStream::from(vec![7u8; 1024]),
        );

        let written = handle.write_to(&path).await.unwrap();

        assert_eq!(written, 1024);
        assert_eq!(std::fs::read(&path).unwrap(), vec![7u8; 1024]);
    }

    #[tokio::test]
    async fn test_handle_write_to_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.bin");
        let handle = ObjectHandle::new(
            ObjectLocator::new("gmax", "files"),
            ByteStream::from_static(b"x"),
        );

        let result = handle.write_to(&path).await;
        assert!(matches!(result, Err(StoreError::LocalIo { .. })));
    }
}
