use std::{convert::TryInto, fmt::Display, str::FromStr};

use base64::Engine;

use crate::aws::sigv4::signer::uri_encode;
use crate::storage::{Error, StorageResult};

const MAX_KEY_LEN: usize = 1024;

/// See [S3 ListObjectsV2 API reference](https://docs.aws.amazon.com/AmazonS3/latest/API/API_ListObjectsV2.html)
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct ObjectsListRequest {
    pub prefix: Option<String>,
    pub delimiter: Option<String>,
    pub max_keys: Option<usize>,
    pub start_after: Option<String>,
    pub continuation_token: Option<String>,
}

impl ObjectsListRequest {
    /// Query string, percent encoded the way the request signature expects it.
    pub fn to_query(&self) -> String {
        let mut params = vec![("list-type".to_owned(), "2".to_owned())];
        let mut push = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                params.push((key.to_owned(), uri_encode(&value)));
            }
        };
        push("continuation-token", self.continuation_token.clone());
        push("delimiter", self.delimiter.clone());
        push("max-keys", self.max_keys.map(|x| x.to_string()));
        push("prefix", self.prefix.clone());
        push("start-after", self.start_after.clone());

        params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// ListObjectsV2 response
#[derive(Debug, serde::Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub(in crate::aws::storage) struct ListBucketResult {
    pub name: Option<String>,
    pub key_count: Option<u64>,
    #[serde(default)]
    pub is_truncated: bool,
    pub next_continuation_token: Option<String>,
    #[serde(default = "Vec::new")]
    pub contents: Vec<ObjectSummary>,
}

/// Provider defined tier of a stored object, `STANDARD` when the service omits it.
#[derive(Debug, PartialEq, Eq, Clone, Default, serde::Deserialize)]
#[serde(from = "String")]
pub enum StorageClass {
    #[default]
    Standard,
    ReducedRedundancy,
    StandardIa,
    OnezoneIa,
    IntelligentTiering,
    Glacier,
    DeepArchive,
    GlacierIr,
    Outposts,
    Snow,
    ExpressOnezone,
    Other(String),
}

impl StorageClass {
    pub fn as_str(&self) -> &str {
        match self {
            StorageClass::Standard => "STANDARD",
            StorageClass::ReducedRedundancy => "REDUCED_REDUNDANCY",
            StorageClass::StandardIa => "STANDARD_IA",
            StorageClass::OnezoneIa => "ONEZONE_IA",
            StorageClass::IntelligentTiering => "INTELLIGENT_TIERING",
            StorageClass::Glacier => "GLACIER",
            StorageClass::DeepArchive => "DEEP_ARCHIVE",
            StorageClass::GlacierIr => "GLACIER_IR",
            StorageClass::Outposts => "OUTPOSTS",
            StorageClass::Snow => "SNOW",
            StorageClass::ExpressOnezone => "EXPRESS_ONEZONE",
            StorageClass::Other(other) => other.as_str(),
        }
    }
}

impl From<String> for StorageClass {
    fn from(value: String) -> Self {
        match value.as_str() {
            "STANDARD" => StorageClass::Standard,
            "REDUCED_REDUNDANCY" => StorageClass::ReducedRedundancy,
            "STANDARD_IA" => StorageClass::StandardIa,
            "ONEZONE_IA" => StorageClass::OnezoneIa,
            "INTELLIGENT_TIERING" => StorageClass::IntelligentTiering,
            "GLACIER" => StorageClass::Glacier,
            "DEEP_ARCHIVE" => StorageClass::DeepArchive,
            "GLACIER_IR" => StorageClass::GlacierIr,
            "OUTPOSTS" => StorageClass::Outposts,
            "SNOW" => StorageClass::Snow,
            "EXPRESS_ONEZONE" => StorageClass::ExpressOnezone,
            _ => StorageClass::Other(value),
        }
    }
}

impl Display for StorageClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ListObjectsV2 response item
#[derive(Debug, PartialEq, Eq, Clone, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectSummary {
    pub key: String,
    pub last_modified: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "ETag")]
    pub etag: Option<String>,
    pub size: u64,
    #[serde(default)]
    pub storage_class: StorageClass,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Object {
    pub bucket: String,
    pub key: String,
}

impl Display for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.s3_url())
    }
}

impl Object {
    pub fn s3_url(&self) -> String {
        format!("s3://{}/{}", &self.bucket, &self.key)
    }

    /// References: `<https://docs.aws.amazon.com/AmazonS3/latest/userguide/object-keys.html>`
    pub fn new(bucket: &str, key: &str) -> StorageResult<Self> {
        if bucket.is_empty() {
            return Err(Error::S3InvalidBucketName {
                name: bucket.to_owned(),
                message: "must not be empty".to_owned(),
            });
        }

        if key.is_empty() || key.len() > MAX_KEY_LEN {
            return Err(Error::S3InvalidObjectKey {
                key: key.to_owned(),
            });
        }

        Ok(Self {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
        })
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct CRC32C {
    value: u32,
}

impl CRC32C {
    pub fn new(value: u32) -> Self {
        Self { value }
    }

    pub fn append(self, data: &[u8]) -> Self {
        Self::new(crc32c::crc32c_append(self.value, data))
    }

    pub fn to_u32(&self) -> u32 {
        self.value
    }

    /// Value of the `x-amz-checksum-crc32c` header: base64 of the big endian checksum.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.value.to_be_bytes())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Base64EncodedCRC32CError {
    Base64DecodeError(String),
    Base64ToU32BigEndianError(Vec<u8>),
}

impl Display for Base64EncodedCRC32CError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for CRC32C {
    type Err = Base64EncodedCRC32CError;

    fn from_str(base64crc32c: &str) -> Result<Self, Self::Err> {
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(base64crc32c)
            .map_err(|err| Base64EncodedCRC32CError::Base64DecodeError(format!("{:?}", err)))?;
        let crc32c = decoded
            .try_into()
            .map(u32::from_be_bytes)
            .map_err(Base64EncodedCRC32CError::Base64ToU32BigEndianError)?;
        Ok(CRC32C::new(crc32c))
    }
}
