use std::{
    collections::{BTreeMap, HashMap},
    sync::Mutex,
};

use s3_bucket_demo::{
    demo::StorageService,
    storage::{BucketSummary, Error, ObjectSummary, StorageClass, StorageResult, WaitCondition},
};
use tokio::{fs::File, io::AsyncReadExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    ListBuckets,
    CreateBucket,
    WaitUntilBucketExists,
    UploadObject,
    ListObjects,
    DeleteBucket,
    WaitUntilBucketNotExists,
}

#[derive(Debug, Default)]
struct MemoryBucket {
    region: String,
    objects: BTreeMap<String, ObjectSummary>,
}

#[derive(Debug, Default)]
struct State {
    buckets: BTreeMap<String, MemoryBucket>,
    calls: Vec<Call>,
    failures: HashMap<Call, Error>,
}

/// Object store kept in memory, recording every call it serves.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: Mutex<State>,
}

fn not_found(name: &str, code: &str) -> Error {
    Error::S3ResourceNotFound {
        url: format!("memory://{}", name),
        code: Some(code.to_owned()),
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_buckets(names: &[&str]) -> Self {
        let storage = Self::new();
        {
            let mut state = storage.state.lock().unwrap();
            for name in names {
                state
                    .buckets
                    .insert(name.to_string(), MemoryBucket::default());
            }
        }
        storage
    }

    /// The next `call` fails with `error`.
    pub fn fail_on(self, call: Call, error: Error) -> Self {
        self.state.lock().unwrap().failures.insert(call, error);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn bucket_names(&self) -> Vec<String> {
        self.state.lock().unwrap().buckets.keys().cloned().collect()
    }

    pub fn region_of(&self, bucket: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.buckets.get(bucket).map(|b| b.region.clone())
    }

    fn record(&self, call: Call) -> StorageResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        match state.failures.remove(&call) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn wait(&self, name: &str, condition: WaitCondition) -> StorageResult<()> {
        let exists = self.state.lock().unwrap().buckets.contains_key(name);
        let met = match condition {
            WaitCondition::Exists => exists,
            WaitCondition::NotExists => !exists,
        };
        if met {
            Ok(())
        } else {
            Err(Error::S3WaiterTimeout {
                bucket: name.to_owned(),
                condition,
                attempts: 1,
            })
        }
    }
}

#[async_trait::async_trait]
impl StorageService for MemoryStorage {
    async fn list_buckets(&self) -> StorageResult<Vec<BucketSummary>> {
        self.record(Call::ListBuckets)?;
        let state = self.state.lock().unwrap();
        Ok(state
            .buckets
            .keys()
            .map(|name| BucketSummary {
                name: name.to_owned(),
                creation_date: None,
            })
            .collect())
    }

    async fn create_bucket(&self, name: &str, region: &str) -> StorageResult<()> {
        self.record(Call::CreateBucket)?;
        let mut state = self.state.lock().unwrap();
        if state.buckets.contains_key(name) {
            return Err(Error::S3ServiceError {
                url: format!("memory://{}", name),
                status: 409,
                code: "BucketAlreadyExists".to_owned(),
                message: "The requested bucket name is not available.".to_owned(),
                request_id: None,
            });
        }
        let bucket = MemoryBucket {
            region: region.to_owned(),
            objects: BTreeMap::new(),
        };
        state.buckets.insert(name.to_owned(), bucket);
        Ok(())
    }

    async fn wait_until_bucket_exists(&self, name: &str) -> StorageResult<()> {
        self.record(Call::WaitUntilBucketExists)?;
        self.wait(name, WaitCondition::Exists)
    }

    async fn upload_object(&self, bucket: &str, key: &str, mut file: File) -> StorageResult<()> {
        self.record(Call::UploadObject)?;
        let mut content = Vec::new();
        file.read_to_end(&mut content)
            .await
            .map_err(|error| Error::S3FileError {
                message: format!("unable to read {}", key),
                error,
            })?;

        let mut state = self.state.lock().unwrap();
        let b = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| not_found(bucket, "NoSuchBucket"))?;
        let summary = ObjectSummary {
            key: key.to_owned(),
            last_modified: chrono::Utc::now(),
            etag: None,
            size: content.len() as u64,
            storage_class: StorageClass::Standard,
        };
        b.objects.insert(key.to_owned(), summary);
        Ok(())
    }

    async fn list_objects(&self, bucket: &str) -> StorageResult<Vec<ObjectSummary>> {
        self.record(Call::ListObjects)?;
        let state = self.state.lock().unwrap();
        let b = state
            .buckets
            .get(bucket)
            .ok_or_else(|| not_found(bucket, "NoSuchBucket"))?;
        Ok(b.objects.values().cloned().collect())
    }

    async fn delete_bucket(&self, name: &str) -> StorageResult<()> {
        self.record(Call::DeleteBucket)?;
        let mut state = self.state.lock().unwrap();
        state
            .buckets
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| not_found(name, "NoSuchBucket"))
    }

    async fn wait_until_bucket_not_exists(&self, name: &str) -> StorageResult<()> {
        self.record(Call::WaitUntilBucketNotExists)?;
        self.wait(name, WaitCondition::NotExists)
    }
}
