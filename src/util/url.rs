use url::Url;

use crate::model::{error::StoreError, object::EndpointConfig};

/// Computes the public-style url of an object without contacting the service.
///
/// A custom endpoint is addressed path-style (`{endpoint}/{bucket}/{key}`), the
/// public AWS endpoint virtual-hosted-style (`https://{bucket}.s3.{region}.amazonaws.com/{key}`).
/// Keys are kept verbatim: `.` and `..` segments are encoded, never resolved.
pub fn resource_url(
    endpoint: Option<&EndpointConfig>,
    bucket: &str,
    key: &str,
) -> Result<String, StoreError> {
    let custom = match endpoint {
        Some(config) => config.custom_endpoint()?,
        None => None,
    };

    let base = match custom {
        Some(endpoint_url) => {
            let url = Url::parse(endpoint_url).map_err(|err| {
                StoreError::Config(format!(
                    "failed to parse endpoint url: {}, {}",
                    endpoint_url, err
                ))
            })?;
            if url.cannot_be_a_base() {
                return Err(StoreError::Config(format!(
                    "endpoint url cannot be a base: {}",
                    endpoint_url
                )));
            }
            format!(
                "{}/{}",
                url.as_str().trim_end_matches('/'),
                encode_segment(bucket)
            )
        }
        None => {
            let host = match endpoint.and_then(|config| config.region.as_deref()) {
                Some(region) if !region.is_empty() => {
                    format!("https://{}.s3.{}.amazonaws.com", bucket, region)
                }
                _ => format!("https://{}.s3.amazonaws.com", bucket),
            };
            Url::parse(&host).map_err(|err| {
                StoreError::Config(format!("invalid bucket for url: {}, {}", bucket, err))
            })?;
            host
        }
    };

    let path = key.split('/').map(encode_segment).collect::<Vec<_>>().join("/");

    Ok(format!("{}/{}", base, path))
}

// url parsers resolve bare dot segments
fn encode_segment(segment: &str) -> String {
    match segment {
        "." => "%2E".to_string(),
        ".." => "%2E%2E".to_string(),
        s => urlencoding::encode(s).into_owned(),
    }
}
