use std::fmt::Display;

use bytes::Bytes;

use crate::storage::{Error, StorageResult};

/// Region that takes no `LocationConstraint`.
const US_EAST_1: &str = "us-east-1";

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Bucket {
    name: String,
}

impl Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s3://{}", self.name)
    }
}

impl Bucket {
    /// References: `<https://docs.aws.amazon.com/AmazonS3/latest/userguide/bucketnamingrules.html>`
    pub fn new(name: &str) -> StorageResult<Self> {
        let invalid = |message: &str| {
            Err(Error::S3InvalidBucketName {
                name: name.to_owned(),
                message: message.to_owned(),
            })
        };

        if name.len() < 3 || name.len() > 63 {
            return invalid("must be between 3 and 63 characters long");
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-')
        {
            return invalid("can only contain lowercase letters, numbers, dots and hyphens");
        }
        let is_alphanumeric = |c: Option<char>| c.map_or(false, |c| c.is_ascii_alphanumeric());
        if !is_alphanumeric(name.chars().next()) || !is_alphanumeric(name.chars().last()) {
            return invalid("must begin and end with a letter or number");
        }
        if name.contains("..") {
            return invalid("must not contain two adjacent periods");
        }
        if name.parse::<std::net::Ipv4Addr>().is_ok() {
            return invalid("must not be formatted as an IP address");
        }
        if name.starts_with("xn--") || name.ends_with("-s3alias") {
            return invalid("must not use a reserved prefix or suffix");
        }

        Ok(Self {
            name: name.to_owned(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// ListBuckets response item
#[derive(Debug, PartialEq, Eq, Clone, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BucketSummary {
    pub name: String,
    pub creation_date: Option<chrono::DateTime<chrono::Utc>>,
}

/// ListBuckets response
#[derive(Debug, serde::Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub(in crate::aws::storage) struct ListAllMyBucketsResult {
    #[serde(default)]
    pub buckets: Buckets,
}

#[derive(Debug, serde::Deserialize, Default)]
pub(in crate::aws::storage) struct Buckets {
    #[serde(rename = "Bucket", default = "Vec::new")]
    pub items: Vec<BucketSummary>,
}

/// CreateBucket request body, `None` when the region is the implicit default one.
pub(in crate::aws::storage) fn create_bucket_configuration(region: &str) -> Option<Bytes> {
    if region.is_empty() || region == US_EAST_1 {
        return None;
    }
    let xml = format!(
        r#"<CreateBucketConfiguration xmlns="http://s3.amazonaws.com/doc/2006-03-01/"><LocationConstraint>{}</LocationConstraint></CreateBucketConfiguration>"#,
        quick_xml::escape::escape(region)
    );
    Some(Bytes::from(xml))
}
