pub mod bucket;
pub mod object;

use reqwest::Url;

use crate::aws::{
    config::Config,
    sigv4::signer::{uri_encode, uri_encode_path},
};

use super::{Error, StorageResult};
use bucket::Bucket;
use object::Object;

/// Body of every non success S3 response.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct ErrorResponse {
    pub code: String,
    #[serde(default)]
    pub message: String,
    pub request_id: Option<String>,
}

pub(super) fn from_xml<T>(url: &str, xml: &str) -> StorageResult<T>
where
    T: serde::de::DeserializeOwned,
{
    quick_xml::de::from_str(xml).map_err(|err| Error::invalid_xml::<T>(url, err))
}

/// Where requests are sent and how buckets are addressed.
///
/// AWS uses virtual hosted buckets (`https://<bucket>.s3.<region>.amazonaws.com/<key>`), custom
/// S3 compatible services are addressed path style (`http://host:port/<bucket>/<key>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base: Url,
    path_style: bool,
}

impl Endpoint {
    pub fn aws(region: &str) -> StorageResult<Self> {
        Self::parse(&format!("https://s3.{}.amazonaws.com", region), false)
    }

    pub fn custom(url: &str) -> StorageResult<Self> {
        Self::parse(url, true)
    }

    pub fn from_config(config: &Config) -> StorageResult<Self> {
        match &config.endpoint {
            Some(url) => Self::custom(url),
            None => Self::aws(&config.region),
        }
    }

    fn parse(url: &str, path_style: bool) -> StorageResult<Self> {
        let invalid = |message: String| Error::S3InvalidEndpoint {
            url: url.to_owned(),
            message,
        };
        let mut base = Url::parse(url).map_err(|err| invalid(err.to_string()))?;
        if base.host_str().is_none() || !matches!(base.scheme(), "http" | "https") {
            return Err(invalid("expected an http(s) url with a host".to_owned()));
        }
        base.set_path("/");
        base.set_query(None);
        base.set_fragment(None);
        Ok(Self { base, path_style })
    }

    pub fn service_url(&self) -> Url {
        self.base.clone()
    }

    pub fn bucket_url(&self, bucket: &Bucket) -> StorageResult<Url> {
        self.url(bucket.name(), "")
    }

    pub fn object_url(&self, object: &Object) -> StorageResult<Url> {
        self.url(&object.bucket, &format!("/{}", uri_encode_path(&object.key)))
    }

    fn url(&self, bucket: &str, path: &str) -> StorageResult<Url> {
        let mut url = self.base.clone();
        if self.path_style {
            url.set_path(&format!("/{}{}", uri_encode(bucket), path));
        } else {
            let host = format!("{}.{}", bucket, self.base.host_str().unwrap_or_default());
            url.set_host(Some(&host))
                .map_err(|err| Error::S3InvalidEndpoint {
                    url: host.to_owned(),
                    message: err.to_string(),
                })?;
            url.set_path(if path.is_empty() { "/" } else { path });
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        aws::config::Config,
        storage::{Bucket, Endpoint, Error, Object},
    };

    #[test]
    fn test_aws_virtual_hosted_urls() {
        let endpoint = Endpoint::aws("ap-southeast-2").unwrap();
        let bucket = Bucket::new("demo-bucket-123").unwrap();
        let object = Object::new("demo-bucket-123", "dir/read me.txt").unwrap();

        assert_eq!(
            "https://s3.ap-southeast-2.amazonaws.com/",
            endpoint.service_url().as_str()
        );
        assert_eq!(
            "https://demo-bucket-123.s3.ap-southeast-2.amazonaws.com/",
            endpoint.bucket_url(&bucket).unwrap().as_str()
        );
        assert_eq!(
            "https://demo-bucket-123.s3.ap-southeast-2.amazonaws.com/dir/read%20me.txt",
            endpoint.object_url(&object).unwrap().as_str()
        );
    }

    #[test]
    fn test_custom_path_style_urls() {
        let endpoint = Endpoint::custom("http://127.0.0.1:9000/ignored?x=1").unwrap();
        let bucket = Bucket::new("demo-bucket-123").unwrap();
        let object = Object::new("demo-bucket-123", "a+b.txt").unwrap();

        assert_eq!("http://127.0.0.1:9000/", endpoint.service_url().as_str());
        assert_eq!(
            "http://127.0.0.1:9000/demo-bucket-123",
            endpoint.bucket_url(&bucket).unwrap().as_str()
        );
        assert_eq!(
            "http://127.0.0.1:9000/demo-bucket-123/a%2Bb.txt",
            endpoint.object_url(&object).unwrap().as_str()
        );
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(matches!(
            Endpoint::custom("not a url").unwrap_err(),
            Error::S3InvalidEndpoint { .. }
        ));
        assert!(matches!(
            Endpoint::custom("ftp://host/").unwrap_err(),
            Error::S3InvalidEndpoint { .. }
        ));
    }

    #[test]
    fn test_endpoint_from_config() {
        let config = Config::new("eu-west-3", "/tmp/credentials");
        assert_eq!(Endpoint::aws("eu-west-3").unwrap(), Endpoint::from_config(&config).unwrap());

        let config = config.with_endpoint("http://localhost:9000");
        assert_eq!(
            Endpoint::custom("http://localhost:9000").unwrap(),
            Endpoint::from_config(&config).unwrap()
        );
    }
}
