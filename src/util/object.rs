use crate::model::{error::StoreError, object::ObjectLocator};

const S3_SCHEME: &str = "s3://";

/// Parses `s3://bucket/key/path` into a locator. The key may be empty
/// (`s3://bucket` or `s3://bucket/`), which lists the whole bucket.
pub fn parse_locator(uri: &str) -> Result<ObjectLocator, StoreError> {
    let rest = match uri.strip_prefix(S3_SCHEME) {
        Some(rest) => rest,
        None => {
            return Err(StoreError::Config(format!(
                "failed to parse object uri: {}, expected {}bucket/key",
                uri, S3_SCHEME
            )))
        }
    };

    let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));

    if bucket.is_empty() {
        return Err(StoreError::Config(format!(
            "failed to parse bucket of: {}",
            uri
        )));
    }

    Ok(ObjectLocator::new(bucket, key))
}

/// Parses a bare bucket name or an `s3://bucket` uri.
pub fn parse_bucket(value: &str) -> Result<String, StoreError> {
    if value.starts_with(S3_SCHEME) {
        return parse_locator(value).map(|locator| locator.bucket);
    }

    if value.is_empty() || value.contains('/') {
        return Err(StoreError::Config(format!("invalid bucket name: {}", value)));
    }

    Ok(value.to_string())
}
