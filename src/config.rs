use clap::Args;

use crate::model::{
    error::StoreError,
    object::{Credentials, EndpointConfig},
};

/// Connection parameters of the object store.
#[derive(Debug, Clone, Args)]
pub struct StoreArgs {
    /// The access key ID.
    #[arg(env = "OBJECTSTORE_ACCESS_KEY_ID", long)]
    pub access_key_id: String,

    /// The secret access key.
    #[arg(env = "OBJECTSTORE_SECRET_ACCESS_KEY", long, hide_env_values = true)]
    pub secret_access_key: String,

    /// Send requests to `--endpoint-url` instead of the public AWS endpoint.
    #[arg(env = "OBJECTSTORE_USE_CUSTOM_ENDPOINT", long)]
    pub use_custom_endpoint: bool,

    /// Custom endpoint, e.g. a local emulator.
    #[arg(env = "OBJECTSTORE_ENDPOINT_URL", long)]
    pub endpoint_url: Option<String>,

    /// The region.
    #[arg(env = "OBJECTSTORE_REGION", long)]
    pub region: Option<String>,
}

impl StoreArgs {
    pub fn validate(&self) -> Result<(Credentials, Option<EndpointConfig>), StoreError> {
        if self.access_key_id.trim().is_empty() {
            return Err(StoreError::Config("access key id must not be empty".to_string()));
        }
        if self.secret_access_key.trim().is_empty() {
            return Err(StoreError::Config(
                "secret access key must not be empty".to_string(),
            ));
        }

        let credentials = Credentials::new(&self.access_key_id, &self.secret_access_key);

        let endpoint = EndpointConfig {
            use_custom_endpoint: self.use_custom_endpoint,
            endpoint_url: self.endpoint_url.clone(),
            region: self.region.clone(),
        };
        endpoint.custom_endpoint()?;

        if !endpoint.use_custom_endpoint && endpoint.region.is_none() {
            return Ok((credentials, None));
        }

        Ok((credentials, Some(endpoint)))
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        store: StoreArgs,
    }

    fn parse(args: &[&str]) -> StoreArgs {
        let mut argv = vec!["objectstore"];
        argv.extend_from_slice(args);
        TestCli::try_parse_from(argv).unwrap().store
    }

    #[test]
    fn test_validate() {
        let cases = vec![
            (
                vec!["--access-key-id", "AKIA", "--secret-access-key", "s"],
                Some(None),
            ),
            (
                vec![
                    "--access-key-id",
                    "AKIA",
                    "--secret-access-key",
                    "s",
                    "--region",
                    "eu-west-1",
                ],
                Some(Some(EndpointConfig::region("eu-west-1"))),
            ),
            (
                vec![
                    "--access-key-id",
                    "AKIA",
                    "--secret-access-key",
                    "s",
                    "--use-custom-endpoint",
                    "--endpoint-url",
                    "http://localhost:9000",
                ],
                Some(Some(EndpointConfig::custom("http://localhost:9000", None))),
            ),
            (
                vec![
                    "--access-key-id",
                    "AKIA",
                    "--secret-access-key",
                    "s",
                    "--use-custom-endpoint",
                ],
                None,
            ),
            (vec!["--access-key-id", " ", "--secret-access-key", "s"], None),
        ];

        for (args, expected) in cases {
            let result = parse(&args).validate();
            match expected {
                Some(endpoint) => {
                    let (creds, parsed) = result.unwrap();
                    assert_eq!(creds.access_key_id(), "AKIA", "failed for case: {:?}", args);
                    assert_eq!(parsed, endpoint, "failed for case: {:?}", args);
                }
                None => assert!(
                    matches!(result, Err(StoreError::Config(_))),
                    "failed for case: {:?}",
                    args
                ),
            }
        }
    }
}
