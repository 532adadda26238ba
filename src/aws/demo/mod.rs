mod args;
mod s3;

use std::{
    fmt::Display,
    io::Write,
    path::{Path, PathBuf},
};

use tokio::fs::File;

use super::{
    config::Config,
    storage::{self, BucketSummary, ObjectSummary, StorageResult, WaitCondition},
};

pub use args::Args;
pub use s3::S3Service;

/// Everything the bucket walkthrough needs from an object store.
#[async_trait::async_trait]
pub trait StorageService {
    async fn list_buckets(&self) -> StorageResult<Vec<BucketSummary>>;
    async fn create_bucket(&self, name: &str, region: &str) -> StorageResult<()>;
    async fn wait_until_bucket_exists(&self, name: &str) -> StorageResult<()>;
    /// Takes the file by value: it is closed once the upload ends, whatever the outcome.
    async fn upload_object(&self, bucket: &str, key: &str, file: File) -> StorageResult<()>;
    async fn list_objects(&self, bucket: &str) -> StorageResult<Vec<ObjectSummary>>;
    async fn delete_bucket(&self, name: &str) -> StorageResult<()>;
    async fn wait_until_bucket_not_exists(&self, name: &str) -> StorageResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Init,
    Listed,
    Created,
    ConfirmedExists,
    Uploaded,
    ListedObjects,
    ListedAgain,
    Deleted,
    ConfirmedAbsent,
    ListedFinal,
    Done,
    Failed,
}

/// The remote call a run failed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    ListBuckets,
    CreateBucket { bucket: String },
    WaitForBucket { bucket: String, condition: WaitCondition },
    Upload { bucket: String, key: String },
    ListObjects { bucket: String },
    DeleteBucket { bucket: String },
}

impl Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::ListBuckets => f.write_str("Unable to list buckets"),
            Operation::CreateBucket { .. } => f.write_str("Unable to create bucket"),
            Operation::WaitForBucket { bucket, condition } => write!(
                f,
                "Error occurred while waiting for bucket {:?} to {}",
                bucket, condition
            ),
            Operation::Upload { bucket, key } => {
                write!(f, "Unable to upload {:?} to {:?}", key, bucket)
            }
            Operation::ListObjects { bucket } => {
                write!(f, "Unable to list items in bucket {:?}", bucket)
            }
            Operation::DeleteBucket { .. } => f.write_str("Unable to delete bucket"),
        }
    }
}

#[derive(Debug)]
pub enum RunError {
    Argument(structopt::clap::Error),
    LocalIo {
        path: PathBuf,
        error: std::io::Error,
    },
    Service {
        operation: Operation,
        error: storage::Error,
    },
    Timeout {
        operation: Operation,
        error: storage::Error,
    },
    Setup(storage::Error),
    Output(std::io::Error),
    AlreadyRan,
}

impl RunError {
    fn local_io<T>(path: T, error: std::io::Error) -> Self
    where
        T: AsRef<Path>,
    {
        RunError::LocalIo {
            path: path.as_ref().to_path_buf(),
            error,
        }
    }

    /// Splits storage failures: an unconverged poll is a timeout, an unreadable upload source is
    /// a local error, everything else comes from the service.
    fn from_storage(operation: Operation, path: Option<&Path>, error: storage::Error) -> Self {
        match (error, path) {
            (error @ storage::Error::S3WaiterTimeout { .. }, _) => {
                RunError::Timeout { operation, error }
            }
            (storage::Error::S3FileError { message, error }, Some(path)) => RunError::local_io(
                path,
                std::io::Error::new(error.kind(), format!("{}: {}", message, error)),
            ),
            (error, _) => RunError::Service { operation, error },
        }
    }
}

impl Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::Argument(e) => write!(f, "{}", e),
            RunError::LocalIo { path, error } => {
                write!(f, "Unable to open file {:?}, {}", path.display().to_string(), error)
            }
            RunError::Service { operation, error } | RunError::Timeout { operation, error } => {
                write!(f, "{}, {}", operation, error)
            }
            RunError::Setup(e) => write!(f, "Unable to load configuration, {}", e),
            RunError::Output(e) => write!(f, "Unable to write report, {}", e),
            RunError::AlreadyRan => f.write_str("this demo already ran, build a new one"),
        }
    }
}

impl std::error::Error for RunError {}

pub type RunResult<T> = std::result::Result<T, RunError>;

/// Object key of an uploaded file: the path exactly as it was given.
pub fn object_key(path: &Path) -> RunResult<String> {
    if path.as_os_str().is_empty() {
        return Err(RunError::local_io(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty file path"),
        ));
    }
    Ok(path.to_string_lossy().into_owned())
}

/// Walks one bucket through its lifecycle, reporting every step to `out`.
///
/// A run stops at the first failure and leaves the store as it is: a bucket created before a
/// failed upload is not cleaned up.
pub struct Demo<S, W> {
    service: S,
    region: String,
    out: W,
    state: State,
}

impl<S, W> Demo<S, W>
where
    S: StorageService,
    W: Write,
{
    pub fn new(service: S, config: &Config, out: W) -> Self {
        Self {
            service,
            region: config.region.clone(),
            out,
            state: State::Init,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn into_output(self) -> W {
        self.out
    }

    pub async fn run<T>(&mut self, bucket: &str, path: T) -> RunResult<()>
    where
        T: AsRef<Path>,
    {
        if self.state != State::Init {
            return Err(RunError::AlreadyRan);
        }

        let result = self.steps(bucket, path.as_ref()).await;
        if let Err(e) = &result {
            tracing::info!(state = ?self.state, error = %e, "demo failed");
            self.state = State::Failed;
        }
        result
    }

    async fn steps(&mut self, bucket: &str, path: &Path) -> RunResult<()> {
        self.list_buckets().await?;
        self.state = State::Listed;

        self.create_bucket(bucket).await?;

        self.upload(bucket, path).await?;
        self.state = State::Uploaded;

        self.list_objects(bucket).await?;
        self.state = State::ListedObjects;

        self.list_buckets().await?;
        self.state = State::ListedAgain;

        self.delete_bucket(bucket).await?;

        self.list_buckets().await?;
        self.state = State::ListedFinal;

        self.out.flush().map_err(RunError::Output)?;
        self.state = State::Done;
        Ok(())
    }

    fn print(&mut self, text: impl Display) -> RunResult<()> {
        write!(self.out, "{}", text).map_err(RunError::Output)
    }

    async fn list_buckets(&mut self) -> RunResult<()> {
        tracing::info!("listing buckets");
        let buckets = self
            .service
            .list_buckets()
            .await
            .map_err(|e| RunError::from_storage(Operation::ListBuckets, None, e))?;

        self.print("My buckets now are:\n")?;
        for b in buckets {
            self.print(format_args!("{}\n", b.name))?;
        }
        self.print("\n")
    }

    async fn create_bucket(&mut self, bucket: &str) -> RunResult<()> {
        self.print(format_args!("\nCreating a new bucket named '{}'...\n\n", bucket))?;
        tracing::info!(bucket, region = %self.region, "creating bucket");
        self.service
            .create_bucket(bucket, &self.region)
            .await
            .map_err(|e| {
                let operation = Operation::CreateBucket {
                    bucket: bucket.to_owned(),
                };
                RunError::from_storage(operation, None, e)
            })?;
        self.state = State::Created;

        self.wait(bucket, WaitCondition::Exists).await?;
        self.state = State::ConfirmedExists;
        Ok(())
    }

    async fn wait(&mut self, bucket: &str, condition: WaitCondition) -> RunResult<()> {
        tracing::info!(bucket, %condition, "waiting for bucket");
        let result = match condition {
            WaitCondition::Exists => self.service.wait_until_bucket_exists(bucket).await,
            WaitCondition::NotExists => self.service.wait_until_bucket_not_exists(bucket).await,
        };
        result.map_err(|e| {
            let operation = Operation::WaitForBucket {
                bucket: bucket.to_owned(),
                condition,
            };
            RunError::from_storage(operation, None, e)
        })
    }

    async fn upload(&mut self, bucket: &str, path: &Path) -> RunResult<()> {
        let key = object_key(path)?;
        let file = File::open(path)
            .await
            .map_err(|e| RunError::local_io(path, e))?;

        tracing::info!(bucket, key = %key, "uploading file");
        self.service
            .upload_object(bucket, &key, file)
            .await
            .map_err(|e| {
                let operation = Operation::Upload {
                    bucket: bucket.to_owned(),
                    key: key.clone(),
                };
                RunError::from_storage(operation, Some(path), e)
            })?;

        self.print(format_args!(
            "Successfully uploaded {:?} to {:?}\n",
            key, bucket
        ))
    }

    async fn list_objects(&mut self, bucket: &str) -> RunResult<()> {
        tracing::info!(bucket, "listing objects");
        let objects = self.service.list_objects(bucket).await.map_err(|e| {
            let operation = Operation::ListObjects {
                bucket: bucket.to_owned(),
            };
            RunError::from_storage(operation, None, e)
        })?;

        for item in objects.iter() {
            self.print(format_args!(
                "Name:          {}\nLast modified: {}\nSize:          {}\nStorage class: {}\n\n",
                item.key,
                item.last_modified.format("%Y-%m-%d %H:%M:%S %z %Z"),
                item.size,
                item.storage_class
            ))?;
        }
        self.print(format_args!(
            "Found {} items in bucket {}\n\n",
            objects.len(),
            bucket
        ))
    }

    async fn delete_bucket(&mut self, bucket: &str) -> RunResult<()> {
        self.print(format_args!("\nDeleting the bucket named '{}'...\n\n", bucket))?;
        tracing::info!(bucket, "deleting bucket");
        self.service.delete_bucket(bucket).await.map_err(|e| {
            let operation = Operation::DeleteBucket {
                bucket: bucket.to_owned(),
            };
            RunError::from_storage(operation, None, e)
        })?;
        self.state = State::Deleted;

        self.wait(bucket, WaitCondition::NotExists).await?;
        self.state = State::ConfirmedAbsent;
        Ok(())
    }
}
