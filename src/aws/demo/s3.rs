use futures::TryStreamExt;
use tokio::fs::File;

use super::StorageService;
use crate::aws::{
    config::Config,
    sigv4::credentials::Credentials,
    storage::{
        Bucket, BucketClient, BucketSummary, Object, ObjectClient, ObjectSummary,
        ObjectsListRequest, RetryPolicy, StorageResult,
    },
};

/// [`StorageService`] backed by the S3 REST API.
#[derive(Debug)]
pub struct S3Service {
    buckets: BucketClient,
    objects: ObjectClient,
}

impl S3Service {
    pub fn new(credentials: Credentials, config: &Config) -> StorageResult<Self> {
        Ok(Self {
            buckets: BucketClient::new(credentials.clone(), config)?,
            objects: ObjectClient::new(credentials, config)?,
        })
    }

    pub fn with_retry_policy(self, retry_policy: RetryPolicy) -> Self {
        Self {
            buckets: self.buckets.with_retry_policy(retry_policy),
            objects: self.objects.with_retry_policy(retry_policy),
        }
    }
}

#[async_trait::async_trait]
impl StorageService for S3Service {
    async fn list_buckets(&self) -> StorageResult<Vec<BucketSummary>> {
        self.buckets.list().await
    }

    async fn create_bucket(&self, name: &str, region: &str) -> StorageResult<()> {
        self.buckets.create(&Bucket::new(name)?, region).await
    }

    async fn wait_until_bucket_exists(&self, name: &str) -> StorageResult<()> {
        self.buckets.wait_until_exists(&Bucket::new(name)?).await
    }

    async fn upload_object(&self, bucket: &str, key: &str, file: File) -> StorageResult<()> {
        let o = Object::new(bucket, key)?;
        self.objects.upload_file(&o, &file).await
    }

    async fn list_objects(&self, bucket: &str) -> StorageResult<Vec<ObjectSummary>> {
        let bucket = Bucket::new(bucket)?;
        self.objects
            .list(&bucket, &ObjectsListRequest::default())
            .try_collect()
            .await
    }

    async fn delete_bucket(&self, name: &str) -> StorageResult<()> {
        self.buckets.delete(&Bucket::new(name)?).await
    }

    async fn wait_until_bucket_not_exists(&self, name: &str) -> StorageResult<()> {
        self.buckets.wait_until_not_exists(&Bucket::new(name)?).await
    }
}
