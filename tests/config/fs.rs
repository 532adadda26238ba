use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

pub struct FsTestConfig {
    base_path: tempfile::TempDir,
}

#[allow(dead_code)] //remove this when this issue will be fixed: https://github.com/rust-lang/rust/issues/46379
impl FsTestConfig {
    pub fn new() -> Self {
        let base_path = tempfile::Builder::new()
            .prefix("s3_bucket_demo_tests")
            .tempdir()
            .unwrap();
        Self { base_path }
    }

    pub fn base_path(&self) -> &Path {
        self.base_path.path()
    }

    pub fn file_path(&self, file_name: &str) -> PathBuf {
        let file_name = file_name.strip_prefix('/').unwrap_or(file_name);
        self.base_path().join(file_name)
    }

    pub async fn write(&self, file_name: &str, content: &str) -> PathBuf {
        let path = self.file_path(file_name);
        let mut f = tokio::fs::File::create(&path).await.unwrap();
        f.write_all(content.as_bytes()).await.unwrap();
        f.flush().await.unwrap();
        path
    }

    /// Unique per test run, valid as an S3 bucket name.
    pub fn bucket_name(&self) -> String {
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        format!("demo-{}", &uuid[..12])
    }
}
