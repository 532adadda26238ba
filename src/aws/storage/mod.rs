mod bucket;
mod client;
mod object;
mod resources;
mod retry;

pub use bucket::{BucketClient, WaitCondition};
pub use object::ObjectClient;
pub use resources::{
    bucket::{Bucket, BucketSummary},
    object::{Object, ObjectSummary, ObjectsListRequest, StorageClass, CRC32C},
    Endpoint,
};
pub use retry::RetryPolicy;

pub mod credentials {

    pub mod shared {

        use crate::aws::{config::Config, sigv4::credentials::Credentials};

        use super::super::{Error, StorageResult};

        pub async fn default(config: &Config) -> StorageResult<Credentials> {
            let path = config
                .shared_credentials_path()
                .map_err(Error::S3CredentialsError)?;
            from_file(path, &config.profile).await
        }

        pub fn from_str(str: &str, profile: &str) -> StorageResult<Credentials> {
            Credentials::from_profile_str(str, profile).map_err(Error::S3CredentialsError)
        }

        pub async fn from_file<T>(file_path: T, profile: &str) -> StorageResult<Credentials>
        where
            T: AsRef<std::path::Path>,
        {
            Credentials::from_file(file_path, profile)
                .await
                .map_err(Error::S3CredentialsError)
        }
    }

    pub mod environment {

        use crate::aws::sigv4::credentials::Credentials;

        use super::super::{Error, StorageResult};

        pub fn default() -> StorageResult<Credentials> {
            Credentials::from_env().map_err(Error::S3CredentialsError)
        }
    }

    use crate::aws::{config::Config, sigv4::credentials::Credentials};

    /// Environment credentials when both keys are set, the configured shared profile otherwise.
    pub async fn default(config: &Config) -> super::StorageResult<Credentials> {
        match environment::default() {
            Ok(credentials) => Ok(credentials),
            Err(err) => {
                tracing::debug!(%err, profile = %config.profile, "falling back to shared credentials");
                shared::default(config).await
            }
        }
    }
}

#[derive(Debug)]
pub enum Error {
    S3CredentialsError(super::sigv4::Error),
    S3HttpError(reqwest::Error),
    S3ServiceError {
        url: String,
        status: u16,
        code: String,
        message: String,
        request_id: Option<String>,
    },
    S3UnexpectedResponse {
        url: String,
        status: u16,
        body: String,
    },
    S3InvalidXml {
        url: String,
        expected_type: String,
        error: quick_xml::DeError,
    },
    S3InvalidEndpoint {
        url: String,
        message: String,
    },
    S3InvalidBucketName {
        name: String,
        message: String,
    },
    S3InvalidObjectKey {
        key: String,
    },
    S3ResourceNotFound {
        url: String,
        code: Option<String>,
    },
    S3ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },
    S3WaiterTimeout {
        bucket: String,
        condition: WaitCondition,
        attempts: u32,
    },
    S3FileError {
        message: String,
        error: std::io::Error,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::S3CredentialsError(e) => write!(f, "NoCredentialProviders: {}", e),
            Error::S3HttpError(e) => write!(f, "RequestError: send request failed, {}", e),
            Error::S3ServiceError {
                status,
                code,
                message,
                request_id,
                ..
            } => write!(
                f,
                "{}: {}\n\tstatus code: {}, request id: {}",
                code,
                message,
                status,
                request_id.as_deref().unwrap_or_default()
            ),
            Error::S3UnexpectedResponse { url, status, body } => {
                write!(f, "unexpected response {} from {}: {:?}", status, url, body)
            }
            Error::S3InvalidXml {
                url,
                expected_type,
                error,
            } => write!(
                f,
                "SerializationError: failed to decode {} from {}, {}",
                expected_type, url, error
            ),
            Error::S3InvalidEndpoint { url, message } => {
                write!(f, "invalid endpoint {:?}: {}", url, message)
            }
            Error::S3InvalidBucketName { name, message } => {
                write!(f, "InvalidBucketName: {:?} {}", name, message)
            }
            Error::S3InvalidObjectKey { key } => write!(f, "InvalidObjectKey: {:?}", key),
            Error::S3ResourceNotFound { url, code } => write!(
                f,
                "{}: {} not found",
                code.as_deref().unwrap_or("NotFound"),
                url
            ),
            Error::S3ChecksumMismatch {
                url,
                expected,
                actual,
            } => write!(
                f,
                "BadDigest: crc32c of {} expected {} but the service computed {}",
                url, expected, actual
            ),
            Error::S3WaiterTimeout {
                bucket,
                condition,
                attempts,
            } => write!(
                f,
                "ResourceNotReady: exceeded {} wait attempts for bucket {:?} to {}",
                attempts, bucket, condition
            ),
            Error::S3FileError { message, error } => write!(f, "{}: {}", message, error),
        }
    }
}
impl std::error::Error for Error {}

impl Error {
    fn invalid_xml<T>(url: &str, error: quick_xml::DeError) -> Self {
        Self::S3InvalidXml {
            url: url.to_owned(),
            expected_type: std::any::type_name::<T>().to_owned(),
            error,
        }
    }

    fn file_error(message: &str, object: &Object, error: std::io::Error) -> Self {
        Self::S3FileError {
            message: format!("{} {}", message, object),
            error,
        }
    }

    /// Maps a non success response to the `<Error>` document the service sent, if any.
    fn from_response(url: &str, status: u16, body: String) -> Self {
        let response: Option<resources::ErrorResponse> = quick_xml::de::from_str(&body).ok();
        match (status, response) {
            (404, response) => Self::S3ResourceNotFound {
                url: url.to_owned(),
                code: response.map(|r| r.code),
            },
            (status, Some(response)) => Self::S3ServiceError {
                url: url.to_owned(),
                status,
                code: response.code,
                message: response.message,
                request_id: response.request_id,
            },
            (status, None) => Self::S3UnexpectedResponse {
                url: url.to_owned(),
                status,
                body,
            },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Error::S3HttpError(e) => e.status().map(|s| s.as_u16()),
            Error::S3ServiceError { status, .. } | Error::S3UnexpectedResponse { status, .. } => {
                Some(*status)
            }
            Error::S3ResourceNotFound { .. } => Some(404),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            Error::S3ServiceError { code, .. } => Some(code.as_str()),
            Error::S3ResourceNotFound { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Transient failures worth another attempt within the retry budget.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::S3HttpError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Error::S3ServiceError { status, code, .. } => {
                matches!(status, 429 | 500 | 502 | 503 | 504)
                    || matches!(
                        code.as_str(),
                        "SlowDown" | "RequestTimeout" | "InternalError" | "ServiceUnavailable"
                    )
            }
            Error::S3UnexpectedResponse { status, .. } => {
                matches!(status, 429 | 500 | 502 | 503 | 504)
            }
            _ => false,
        }
    }
}

pub type StorageResult<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use crate::storage::{Error, WaitCondition};

    #[test]
    fn test_service_error_from_response() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error>
  <Code>BucketAlreadyExists</Code>
  <Message>The requested bucket name is not available.</Message>
  <BucketName>demo-bucket-123</BucketName>
  <RequestId>4442587FB7D0A2F9</RequestId>
  <HostId>host-id</HostId>
</Error>"#;
        let e = Error::from_response("url", 409, body.to_owned());

        assert_eq!(Some("BucketAlreadyExists"), e.code());
        assert_eq!(Some(409), e.status());
        assert!(!e.is_retryable());
        assert_eq!(
            "BucketAlreadyExists: The requested bucket name is not available.\n\tstatus code: 409, request id: 4442587FB7D0A2F9",
            format!("{}", e)
        );
    }

    #[test]
    fn test_not_found_from_response() {
        let body = "<Error><Code>NoSuchBucket</Code><Message>gone</Message></Error>";
        let e = Error::from_response("url", 404, body.to_owned());
        assert!(matches!(
            e,
            Error::S3ResourceNotFound { ref code, .. } if code.as_deref() == Some("NoSuchBucket")
        ));

        let e = Error::from_response("url", 404, String::new());
        assert!(matches!(e, Error::S3ResourceNotFound { code: None, .. }));
    }

    #[test]
    fn test_unexpected_response() {
        let e = Error::from_response("url", 503, "<html>busy</html>".to_owned());
        assert!(matches!(e, Error::S3UnexpectedResponse { status: 503, .. }));
        assert!(e.is_retryable());
    }

    #[test]
    fn test_slow_down_is_retryable() {
        let body = "<Error><Code>SlowDown</Code><Message>Reduce your request rate.</Message></Error>";
        assert!(Error::from_response("url", 503, body.to_owned()).is_retryable());
    }

    #[test]
    fn test_waiter_timeout_display() {
        let e = Error::S3WaiterTimeout {
            bucket: "demo".to_owned(),
            condition: WaitCondition::NotExists,
            attempts: 20,
        };
        assert_eq!(
            "ResourceNotReady: exceeded 20 wait attempts for bucket \"demo\" to be deleted",
            format!("{}", e)
        );
    }

    #[tokio::test]
    async fn test_shared_credentials_need_a_home_only_when_read() {
        let mut config = crate::config::Config::new("eu-west-1", "/unused");
        config.credentials_path = None;

        match super::credentials::shared::default(&config).await {
            Err(Error::S3CredentialsError(crate::sigv4::Error::EnvVarError { key, .. })) => {
                assert_eq!("HOME", key)
            }
            other => panic!("expected a missing HOME, got {:?}", other),
        }
    }
}
