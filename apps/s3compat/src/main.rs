//! s3compat - command-line client for S3-compatible object storage.
//!
//! # Usage
//!
//! ```text
//! s3compat put <file> <bucket> <key> [--acl <acl>] [--storage-class <class>] [--content-type <type>]
//! s3compat get <bucket> <key> [<destination>]
//! s3compat head <bucket> <key>
//! s3compat delete <bucket> <key>
//! s3compat sync-clock
//! ```
//!
//! `get` without a destination writes the object to standard output.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `AWS_ACCESS_KEY_ID` / `ACCESS_KEY` | *(unset)* | Access key; unsigned requests when unset |
//! | `AWS_SECRET_ACCESS_KEY` / `SECRET_KEY` | *(unset)* | Secret key |
//! | `S3_ENDPOINT` | `s3.amazonaws.com` | Endpoint host |
//! | `S3_REGION` | inferred | Signing region |
//! | `S3_USE_SSL` | `false` | Use HTTPS |
//! | `S3_SIGNATURE_VERSION` | `v4` | `v2` or `v4` |
//! | `LOG_LEVEL` | `warn` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use s3compat_client::{ClientConfig, GetTarget, PutOptions, S3Client};
use s3compat_core::{Acl, StorageClass};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "s3compat")]
#[command(version, about = "Command-line client for S3-compatible object storage", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
enum Command {
    /// Upload a local file
    Put {
        /// File to upload
        file: PathBuf,
        /// Target bucket
        bucket: String,
        /// Object key
        key: String,
        /// Canned ACL
        #[arg(long, default_value = "private", value_parser = Acl::from_str)]
        acl: Acl,
        /// Storage class
        #[arg(long, default_value = "STANDARD", value_parser = StorageClass::from_str)]
        storage_class: StorageClass,
        /// Content type, guessed from the file extension when omitted
        #[arg(long, value_name = "TYPE")]
        content_type: Option<String>,
    },
    /// Download an object, to standard output when no destination is given
    Get {
        /// Source bucket
        bucket: String,
        /// Object key
        key: String,
        /// Destination file
        destination: Option<PathBuf>,
    },
    /// Print object metadata as JSON
    Head {
        /// Bucket
        bucket: String,
        /// Object key
        key: String,
    },
    /// Delete an object
    Delete {
        /// Bucket
        bucket: String,
        /// Object key
        key: String,
    },
    /// Measure the clock offset against the endpoint
    SyncClock,
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` takes precedence over `log_level`.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    Ok(())
}

fn run(command: Command) -> Result<()> {
    let config = ClientConfig::from_env().context("failed to load endpoint configuration")?;
    if !config.has_auth() {
        info!("no credentials configured, sending unsigned requests");
    }
    let mut client = S3Client::new(config).context("failed to create client")?;

    match command {
        Command::Put {
            file,
            bucket,
            key,
            acl,
            storage_class,
            content_type,
        } => {
            let options = PutOptions {
                acl,
                storage_class,
                content_type,
                ..PutOptions::default()
            };
            let output = client
                .put_object_file(&file, &bucket, &key, &options)
                .with_context(|| format!("failed to upload {}", file.display()))?;
            println!("{}", output.etag.unwrap_or_default());
        }
        Command::Get {
            bucket,
            key,
            destination,
        } => match destination {
            Some(path) => {
                client
                    .get_object(&bucket, &key, GetTarget::Path(path.clone()))
                    .with_context(|| format!("failed to download s3://{bucket}/{key}"))?;
                info!(path = %path.display(), "Saved object");
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                client
                    .get_object(&bucket, &key, GetTarget::Writer(&mut stdout))
                    .with_context(|| format!("failed to download s3://{bucket}/{key}"))?;
            }
        },
        Command::Head { bucket, key } => {
            let info = client
                .get_object_info(&bucket, &key)
                .with_context(|| format!("failed to inspect s3://{bucket}/{key}"))?;
            let Some(info) = info else {
                bail!("s3://{bucket}/{key} does not exist");
            };
            let json = serde_json::json!({
                "size": info.size,
                "time": info.time,
                "type": info.content_type,
                "hash": info.hash,
                "meta": info.meta,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Command::Delete { bucket, key } => {
            client
                .delete_object(&bucket, &key)
                .with_context(|| format!("failed to delete s3://{bucket}/{key}"))?;
        }
        Command::SyncClock => {
            let offset = client.sync_clock().context("failed to read server clock")?;
            println!("{offset}");
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "warn".to_owned());
    init_tracing(&log_level)?;

    run(cli.command)
}
