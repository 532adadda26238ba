//! Walk an S3 bucket through its whole lifecycle
//!
//! - list the buckets visible to the caller
//! - create a bucket and wait until it exists
//! - upload a local file into it, the path as given being the object key
//! - list the bucket content, delete the bucket and wait until it is gone
//!
//! Requests are signed with AWS Signature Version 4 and retried with exponential backoff.
//! Credentials come from `AWS_ACCESS_KEY_ID`/`AWS_SECRET_ACCESS_KEY` or from a shared credentials file profile.
//!
//! Any S3 compatible endpoint can be targeted through `AWS_ENDPOINT_URL_S3`, buckets are then addressed path style.
//!
//! # Quick Start
//! ```rust,no_run
//! use s3_bucket_demo::{
//!     config::Config,
//!     demo::{Demo, RunError, S3Service},
//!     storage::credentials,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), RunError> {
//!     let config = Config::from_env();
//!     let credentials = credentials::default(&config).await.map_err(RunError::Setup)?;
//!     let service = S3Service::new(credentials, &config).map_err(RunError::Setup)?;
//!
//!     let mut demo = Demo::new(service, &config, std::io::stdout());
//!     demo.run("my-test-bucket", "readme.txt").await
//! }
//! ```
//! # Lower level clients
//! - [`storage::BucketClient`] and [`storage::ObjectClient`] talk to S3 directly
mod aws;

pub use aws::{config, demo, sigv4, storage, Client};
