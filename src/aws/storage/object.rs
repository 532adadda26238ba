use std::str::FromStr;

use bytes::BytesMut;
use futures::{future::Either, Stream, StreamExt, TryStreamExt};
use reqwest::{
    header::{CONTENT_LENGTH, CONTENT_TYPE},
    Method,
};
use tokio::{fs::File, io::AsyncSeekExt};
use tokio_util::codec::{BytesCodec, FramedRead};

use crate::aws::{config::Config, sigv4::credentials::Credentials};

use super::{
    client::StorageClient,
    resources::object::{ListBucketResult, ObjectSummary},
    Bucket, Endpoint, Error, Object, ObjectsListRequest, RetryPolicy, StorageResult, CRC32C,
};

const CHECKSUM_CRC32C: &str = "x-amz-checksum-crc32c";

#[derive(Debug)]
pub struct ObjectClient {
    storage_client: StorageClient,
    endpoint: Endpoint,
}

/// A second handle on `file`, positioned at its start. Both handles share the same cursor.
async fn rewound(o: &Object, file: &File) -> StorageResult<File> {
    let mut file = file
        .try_clone()
        .await
        .map_err(|err| Error::file_error("unable to clone file handle for", o, err))?;
    file.rewind()
        .await
        .map_err(|err| Error::file_error("unable to rewind file for", o, err))?;
    Ok(file)
}

impl ObjectClient {
    pub fn new(credentials: Credentials, config: &Config) -> StorageResult<Self> {
        Ok(Self {
            storage_client: StorageClient::new(
                credentials,
                &config.region,
                RetryPolicy::new(config.max_retries),
            ),
            endpoint: Endpoint::from_config(config)?,
        })
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.storage_client = self.storage_client.with_retry_policy(retry_policy);
        self
    }

    async fn crc32c(o: &Object, file: &File) -> StorageResult<CRC32C> {
        FramedRead::new(rewound(o, file).await?, BytesCodec::new())
            .try_fold(CRC32C::default(), |crc32c, chunk| {
                futures::future::ok(crc32c.append(&chunk))
            })
            .await
            .map_err(|err| Error::file_error("unable to read", o, err))
    }

    /// PutObject streaming `file` as the object content.
    ///
    /// The file is read twice: once for its crc32c, sent along so the service rejects a corrupted
    /// upload, then as the request body. Every retry rewinds it, the handle is never closed here.
    pub async fn upload_file(&self, o: &Object, file: &File) -> StorageResult<()> {
        let size = file
            .metadata()
            .await
            .map_err(|err| Error::file_error("unable to read metadata of", o, err))?
            .len();
        let crc32c = Self::crc32c(o, file).await?;
        let url = self.endpoint.object_url(o)?;

        let checksum = crc32c.to_base64();
        let (url, checksum) = (&url, checksum.as_str());
        let response = self
            .storage_client
            .execute(move || async move {
                let body = FramedRead::new(rewound(o, file).await?, BytesCodec::new())
                    .map_ok(BytesMut::freeze);
                self.storage_client
                    .request(Method::PUT, url.clone())
                    .header(CONTENT_LENGTH, size)
                    .header(CONTENT_TYPE, "application/octet-stream")
                    .header(CHECKSUM_CRC32C, checksum)
                    .body(reqwest::Body::wrap_stream(body))
                    .build()
                    .map_err(Error::S3HttpError)
            })
            .await?;

        let echoed = response
            .headers()
            .get(CHECKSUM_CRC32C)
            .and_then(|value| value.to_str().ok())
            .map(CRC32C::from_str);
        match echoed {
            Some(Ok(actual)) if actual != crc32c => Err(Error::S3ChecksumMismatch {
                url: url.to_string(),
                expected: checksum.to_owned(),
                actual: actual.to_base64(),
            }),
            Some(Err(err)) => {
                tracing::debug!(%o, %err, "ignoring unreadable checksum header");
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// ListObjectsV2, following continuation tokens lazily while the listing is truncated.
    pub fn list(
        &self,
        bucket: &Bucket,
        objects_list_request: &ObjectsListRequest,
    ) -> impl Stream<Item = StorageResult<ObjectSummary>> + '_ {
        let objects_list_request = objects_list_request.to_owned();
        let url = match self.endpoint.bucket_url(bucket) {
            Ok(url) => url,
            Err(err) => return Either::Left(futures::stream::once(futures::future::err(err))),
        };

        Either::Right(
            futures::stream::try_unfold(Some(objects_list_request), move |state| {
                let mut url = url.clone();
                async move {
                    match state {
                        None => Ok(None),
                        Some(state) => {
                            url.set_query(Some(&state.to_query()));
                            let objects: ListBucketResult =
                                self.storage_client.get_as_xml(&url).await?;
                            let items = futures::stream::iter(objects.contents).map(Ok);
                            match (objects.is_truncated, objects.next_continuation_token) {
                                (true, Some(next_token)) => {
                                    let new_state = ObjectsListRequest {
                                        continuation_token: Some(next_token),
                                        ..state
                                    };
                                    Ok(Some((items, Some(new_state))))
                                }
                                _ => Ok(Some((items, None))),
                            }
                        }
                    }
                }
            })
            .try_flatten(),
        )
    }
}
