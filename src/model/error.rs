use std::path::PathBuf;

use thiserror::Error;

/// Every failure an object store operation can end with.
///
/// Nothing is retried by this crate; the variant and the provider's
/// status/code are enough for callers to decide on their own retry policy.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Rejected credentials, recognized by the provider's error code. HEAD
    /// requests carry no error body, so a bad key seen first by
    /// `bucket_exists` is reported as [`StoreError::AccessDenied`] instead.
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    #[error("failed to reach object store: {message}")]
    Connectivity { message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("access denied: {message}")]
    AccessDenied { message: String },

    #[error("local io failure at {}: {source}", path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("provider error (status: {status:?}, code: {code:?}): {message}")]
    Provider {
        status: Option<u16>,
        code: Option<String>,
        message: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl StoreError {
    pub fn local_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::LocalIo {
            path: path.into(),
            source,
        }
    }

    /// Short label used as `error_group` in logs.
    pub fn group(&self) -> &'static str {
        match self {
            StoreError::Authentication { .. } => "authentication",
            StoreError::Connectivity { .. } => "connectivity",
            StoreError::NotFound { .. } => "not_found",
            StoreError::AccessDenied { .. } => "access_denied",
            StoreError::LocalIo { .. } => "local_io",
            StoreError::Provider { .. } => "provider",
            StoreError::Config(_) => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let cases = vec![
            (
                StoreError::NotFound {
                    message: "gmax/files".to_string(),
                },
                "not found: gmax/files",
            ),
            (
                StoreError::Provider {
                    status: Some(409),
                    code: Some("BucketAlreadyOwnedByYou".to_string()),
                    message: "conflict".to_string(),
                },
                "provider error (status: Some(409), code: Some(\"BucketAlreadyOwnedByYou\")): conflict",
            ),
            (
                StoreError::local_io(
                    "build.sbt",
                    std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
                ),
                "local io failure at build.sbt: missing",
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.to_string(), expected, "failed for case: {}", expected);
        }
    }

    #[test]
    fn test_group() {
        assert_eq!(StoreError::Config("x".to_string()).group(), "config");
        assert_eq!(
            StoreError::AccessDenied {
                message: "x".to_string()
            }
            .group(),
            "access_denied"
        );
    }
}
