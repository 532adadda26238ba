use std::fmt::Display;

use crate::aws::{
    config::{Config, WaiterConfig},
    sigv4::credentials::Credentials,
};

use super::{
    client::StorageClient,
    resources::bucket::{create_bucket_configuration, ListAllMyBucketsResult},
    Bucket, BucketSummary, Endpoint, Error, RetryPolicy, StorageResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitCondition {
    Exists,
    NotExists,
}

impl Display for WaitCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaitCondition::Exists => f.write_str("exist"),
            WaitCondition::NotExists => f.write_str("be deleted"),
        }
    }
}

impl WaitCondition {
    fn is_met(&self, exists: bool) -> bool {
        match self {
            WaitCondition::Exists => exists,
            WaitCondition::NotExists => !exists,
        }
    }
}

#[derive(Debug)]
pub struct BucketClient {
    storage_client: StorageClient,
    endpoint: Endpoint,
    waiter: WaiterConfig,
}

impl BucketClient {
    pub fn new(credentials: Credentials, config: &Config) -> StorageResult<Self> {
        Ok(Self {
            storage_client: StorageClient::new(
                credentials,
                &config.region,
                RetryPolicy::new(config.max_retries),
            ),
            endpoint: Endpoint::from_config(config)?,
            waiter: config.waiter,
        })
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.storage_client = self.storage_client.with_retry_policy(retry_policy);
        self
    }

    pub async fn list(&self) -> StorageResult<Vec<BucketSummary>> {
        let result: ListAllMyBucketsResult = self
            .storage_client
            .get_as_xml(&self.endpoint.service_url())
            .await?;
        Ok(result.buckets.items)
    }

    pub async fn create(&self, bucket: &Bucket, region: &str) -> StorageResult<()> {
        let url = self.endpoint.bucket_url(bucket)?;
        self.storage_client
            .put(&url, create_bucket_configuration(region))
            .await
    }

    pub async fn delete(&self, bucket: &Bucket) -> StorageResult<()> {
        let url = self.endpoint.bucket_url(bucket)?;
        self.storage_client.delete(&url).await
    }

    /// HeadBucket: a bucket owned by someone else (403) or living in another region (301) exists too.
    pub async fn exists(&self, bucket: &Bucket) -> StorageResult<bool> {
        let url = self.endpoint.bucket_url(bucket)?;
        match self.storage_client.head(&url).await {
            Ok(()) => Ok(true),
            Err(Error::S3ResourceNotFound { .. }) => Ok(false),
            Err(e) if matches!(e.status(), Some(301) | Some(403)) => Ok(true),
            Err(e) => Err(e),
        }
    }

    pub async fn wait_until_exists(&self, bucket: &Bucket) -> StorageResult<()> {
        self.wait_until(bucket, WaitCondition::Exists).await
    }

    pub async fn wait_until_not_exists(&self, bucket: &Bucket) -> StorageResult<()> {
        self.wait_until(bucket, WaitCondition::NotExists).await
    }

    async fn wait_until(&self, bucket: &Bucket, condition: WaitCondition) -> StorageResult<()> {
        let max_attempts = self.waiter.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            let exists = self.exists(bucket).await?;
            tracing::debug!(%bucket, attempt, exists, "polled bucket");
            if condition.is_met(exists) {
                return Ok(());
            }
            if attempt < max_attempts {
                tokio::time::sleep(self.waiter.delay).await;
            }
        }

        Err(Error::S3WaiterTimeout {
            bucket: bucket.name().to_owned(),
            condition,
            attempts: max_attempts,
        })
    }
}
