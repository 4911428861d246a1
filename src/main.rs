use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use objectstore::{
    config::StoreArgs, util, ObjectStore, ObjectStoreClient, StoreError, UploadSpec, Visibility,
};
use tracing::{error, info, span, Instrument, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "objectstore", version, about)]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a bucket unless it already exists.
    EnsureBucket { bucket: String },
    /// Upload a local file to s3://bucket/key.
    Upload {
        object: String,
        file: PathBuf,
        #[arg(long)]
        public: bool,
    },
    /// Download s3://bucket/key into a local file.
    Download { object: String, file: PathBuf },
    /// Print the url of s3://bucket/key.
    Url { object: String },
    /// Print the first object under s3://bucket/prefix.
    Exists { object: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let span = span!(Level::INFO, "main", context = "main");
    match run(cli).instrument(span).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error_message=%err, error_group=err.group());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), StoreError> {
    info!(command = ?cli.command, "called");

    let (credentials, endpoint) = cli.store.validate()?;
    let client = ObjectStoreClient::new(credentials, endpoint);

    match cli.command {
        Command::EnsureBucket { bucket } => {
            let bucket = util::object::parse_bucket(&bucket)?;
            client.ensure_bucket(&bucket).await?;
            println!("{}", bucket);
        }
        Command::Upload {
            object,
            file,
            public,
        } => {
            let spec = UploadSpec {
                locator: util::object::parse_locator(&object)?,
                path: file,
                visibility: Visibility::from_public(public),
            };
            let res = client.upload(&spec).await?;
            println!("{} {}", res.locator, res.e_tag.unwrap_or_default());
        }
        Command::Download { object, file } => {
            let locator = util::object::parse_locator(&object)?;
            let handle = client.download(&locator.bucket, &locator.key).await?;
            let written = handle.write_to(&file).await?;
            info!(bytes = written, file = %file.display(), "downloaded");
        }
        Command::Url { object } => {
            let locator = util::object::parse_locator(&object)?;
            println!("{}", client.resource_url(&locator.bucket, &locator.key)?);
        }
        Command::Exists { object } => {
            let locator = util::object::parse_locator(&object)?;
            match client
                .exists_by_prefix(&locator.bucket, &locator.key)
                .await?
            {
                Some(summary) => {
                    println!("{} {}", summary.key, summary.e_tag.unwrap_or_default())
                }
                None => return Err(StoreError::NotFound {
                    message: format!("no object under: {}", locator),
                }),
            }
        }
    }

    Ok(())
}
