//! Live integration tests for the s3compat client.
//!
//! These tests require a running S3-compatible server. They are marked
//! `#[ignore]` so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! S3_ENDPOINT_URL=http://s3.localhost.localstack.cloud:4566 \
//!     cargo test -p s3compat-integration -- --ignored
//! ```

use std::sync::Once;

use http::Method;
use s3compat_auth::Credentials;
use s3compat_client::executor::execute;
use s3compat_client::request::S3Request;
use s3compat_client::{ClientConfig, ClientResult, S3Client};
use s3compat_core::{EndpointConfig, SignatureVersion};

mod test_object;
mod test_signing;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Endpoint URL for the server.
fn endpoint_url() -> String {
    std::env::var("S3_ENDPOINT_URL")
        .unwrap_or_else(|_| "http://s3.localhost.localstack.cloud:4566".to_owned())
}

/// Endpoint configuration derived from [`endpoint_url`].
#[must_use]
pub fn endpoint(signature_version: SignatureVersion) -> EndpointConfig {
    let url = endpoint_url();
    let (use_ssl, host) = match url.split_once("://") {
        Some((scheme, rest)) => (scheme.eq_ignore_ascii_case("https"), rest),
        None => (false, url.as_str()),
    };
    EndpointConfig::builder()
        .host(host.trim_end_matches('/'))
        .use_ssl(use_ssl)
        .signature_version(signature_version)
        .timeout_secs(30)
        .build()
}

/// Create a client for the live server.
#[must_use]
pub fn s3_client(signature_version: SignatureVersion) -> S3Client {
    init_tracing();

    let credentials = Credentials::from_env().unwrap_or_else(|| Credentials::new("test", "test"));
    let config = ClientConfig::builder()
        .credentials(credentials)
        .endpoint(endpoint(signature_version))
        .build();
    S3Client::new(config).expect("client should build")
}

/// Generate a unique, DNS-compliant bucket name for a test.
#[must_use]
pub fn test_bucket_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// Generate a unique object key.
#[must_use]
pub fn test_key(prefix: &str) -> String {
    format!("{prefix}/{}", uuid::Uuid::new_v4())
}

/// Send a bucket-level request (`PUT` or `DELETE` on the bucket root).
fn bucket_request(client: &S3Client, method: Method, bucket: &str, accepted: &[u16]) -> ClientResult<()> {
    let config = client.config();
    let prepared = S3Request::new(method, bucket, "").prepare(
        &config.endpoint,
        config.signing_credentials(),
        chrono::Utc::now(),
    )?;
    execute(client.transport(), prepared, None)?.interpret(accepted)?;
    Ok(())
}

/// Create a bucket and return its name. Caller is responsible for cleanup.
#[must_use]
pub fn create_test_bucket(client: &S3Client, prefix: &str) -> String {
    let name = test_bucket_name(prefix);
    bucket_request(client, Method::PUT, &name, &[200])
        .unwrap_or_else(|e| panic!("failed to create bucket {name}: {e}"));
    name
}

/// Delete the given keys, then the bucket. Errors are ignored.
pub fn cleanup_bucket(client: &S3Client, bucket: &str, keys: &[&str]) {
    for key in keys {
        let _ = client.delete_object(bucket, key);
    }
    let _ = bucket_request(client, Method::DELETE, bucket, &[204]);
}
