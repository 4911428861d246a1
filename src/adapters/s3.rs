use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};

use async_trait::async_trait;
use aws_config::{meta::region::RegionProviderChain, Region};
use aws_sdk_s3::{
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    primitives::ByteStream,
    types::{BucketLocationConstraint, CreateBucketConfiguration, ObjectCannedAcl},
    Client,
};
use bytes::Bytes;
use tracing::{error, info};

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

pub const DEFAULT_REGION: &str = "us-east-1";
const CREDENTIALS_PROVIDER_NAME: &str = "objectstore-static";

/// [`adapters::ObjectAdapter`] backed by the AWS SDK.
#[derive(Clone, Debug)]
pub struct S3Adapter {
    client: Client,
}

impl S3Adapter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn region(&self) -> String {
        self.client
            .config()
            .region()
            .map(|r| r.to_string())
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
    }
}

#[async_trait]
impl adapters::ObjectAdapter for S3Adapter {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StoreError> {
        let req = self.client.head_bucket().bucket(bucket);

        match req.send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                if let Some(svc_err) = err.as_service_error() {
                    if svc_err.is_not_found() {
                        return Ok(false);
                    }
                }

                // HEAD responses carry no error body, so a bare 404 is all we get
                if status_of(&err) == Some(404) {
                    return Ok(false);
                }

                Err(classify(err, &format!("failed to head_bucket: {}", bucket)))
            }
        }
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        let region = self.region();
        let mut req = self.client.create_bucket().bucket(bucket);

        if region != DEFAULT_REGION {
            let constraint = BucketLocationConstraint::from(region.as_str());
            let cfg = CreateBucketConfiguration::builder()
                .location_constraint(constraint)
                .build();
            req = req.create_bucket_configuration(cfg);
        }

        req.send().await.map_err(|err| {
            classify(
                err,
                &format!("failed to create_bucket: {} in region: {}", bucket, region),
            )
        })?;

        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        visibility: Visibility,
    ) -> Result<UploadResult, StoreError> {
        let req = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .acl(canned_acl(visibility))
            .content_length(body.len() as i64)
            .body(ByteStream::from(body));

        let po = req
            .send()
            .await
            .map_err(|err| classify(err, &format!("failed to put_object at: {}", key)))?;

        Ok(UploadResult {
            locator: ObjectLocator::new(bucket, key),
            e_tag: po.e_tag().map(|tag| tag.to_string()),
            version_id: po.version_id().map(|v| v.to_string()),
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectHandle, StoreError> {
        let req = self.client.get_object().bucket(bucket).key(key);

        let o = req
            .send()
            .await
            .map_err(|err| classify(err, &format!("failed to get_object: {}", key)))?;

        let e_tag = o.e_tag().map(|tag| tag.to_string());
        let content_length = o.content_length();
        let content_type = o.content_type().map(|ct| ct.to_string());

        Ok(ObjectHandle::new(ObjectLocator::new(bucket, key), o.body)
            .with_e_tag(e_tag)
            .with_content_length(content_length)
            .with_content_type(content_type))
    }

    async fn first_object(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Option<ObjectSummary>, StoreError> {
        let req = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .max_keys(1);

        let lo = req
            .send()
            .await
            .map_err(|err| classify(err, &format!("failed to list_objects at: {}", prefix)))?;

        Ok(lo.contents().first().map(|o| {
            let modified_time = o.last_modified().map(|lm| {
                SystemTime::UNIX_EPOCH + Duration::new(lm.secs().max(0) as u64, lm.subsec_nanos())
            });

            ObjectSummary {
                key: o.key().unwrap_or("").to_string(),
                e_tag: o.e_tag().map(|tag| tag.to_string()),
                size: o.size().unwrap_or(0),
                modified_time,
            }
        }))
    }
}

/// Builds an [`S3Adapter`] from static credentials and an optional custom endpoint.
#[derive(Clone, Debug, Default)]
pub struct S3Connector {}

#[async_trait]
impl adapters::Connector for S3Connector {
    async fn connect(
        &self,
        credentials: &Credentials,
        endpoint: Option<&EndpointConfig>,
    ) -> Result<Arc<dyn adapters::ObjectAdapter>, StoreError> {
        if credentials.access_key_id().is_empty() || credentials.secret_access_key().is_empty() {
            let err = StoreError::Authentication {
                message: "access key id and secret access key must not be empty".to_string(),
            };
            error!(error_message=%err, error_group="connect");
            return Err(err);
        }

        let custom_endpoint = match endpoint {
            Some(config) => config.custom_endpoint()?,
            None => None,
        };
        if let Some(url) = custom_endpoint {
            url::Url::parse(url).map_err(|err| {
                StoreError::Config(format!("failed to parse endpoint url: {}, {}", url, err))
            })?;
        }

        let region = endpoint
            .and_then(|config| config.region.clone())
            .filter(|region| !region.is_empty())
            .map(Region::new);
        let region_provider = RegionProviderChain::first_try(region)
            .or_default_provider()
            .or_else(DEFAULT_REGION);

        let static_credentials = aws_credential_types::Credentials::new(
            credentials.access_key_id(),
            credentials.secret_access_key(),
            None,
            None,
            CREDENTIALS_PROVIDER_NAME,
        );

        let sdk_config = aws_config::from_env()
            .credentials_provider(static_credentials)
            .region(region_provider)
            .load()
            .await;

        let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(url) = custom_endpoint {
            // emulators do not resolve virtual-hosted bucket names
            s3_config_builder = s3_config_builder.endpoint_url(url).force_path_style(true);
        }

        let client = Client::from_conf(s3_config_builder.build());
        info!(
            custom_endpoint = ?custom_endpoint,
            region = ?client.config().region(),
            "connected"
        );

        Ok(Arc::new(S3Adapter::new(client)))
    }
}

fn canned_acl(visibility: Visibility) -> ObjectCannedAcl {
    match visibility {
        Visibility::PublicRead => ObjectCannedAcl::PublicRead,
        Visibility::Private => ObjectCannedAcl::Private,
    }
}

fn status_of<E>(err: &SdkError<E>) -> Option<u16> {
    err.raw_response().map(|res| res.status().as_u16())
}

/// Maps an SDK failure onto [`StoreError`], keeping the provider's status and code.
pub(crate) fn classify<E>(err: SdkError<E>, context: &str) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let message = format!("{}, {}", context, DisplayErrorContext(&err));

    match &err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
            StoreError::Connectivity { message }
        }
        _ => classify_response(status_of(&err), err.code().map(|c| c.to_string()), message),
    }
}

fn classify_response(status: Option<u16>, code: Option<String>, message: String) -> StoreError {
    match (code.as_deref(), status) {
        (
            Some(
                "InvalidAccessKeyId"
                | "SignatureDoesNotMatch"
                | "ExpiredToken"
                | "InvalidToken"
                | "AuthorizationHeaderMalformed",
            ),
            _,
        ) => StoreError::Authentication { message },
        (Some("AccessDenied" | "AllAccessDisabled"), _) | (_, Some(403)) => {
            StoreError::AccessDenied { message }
        }
        (Some("NoSuchBucket" | "NoSuchKey" | "NotFound"), _) | (_, Some(404)) => {
            StoreError::NotFound { message }
        }
        _ => StoreError::Provider {
            status,
            code,
            message,
        },
    }
}
