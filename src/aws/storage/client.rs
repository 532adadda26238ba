use std::future::Future;

use bytes::Bytes;
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use super::{resources, retry::RetryPolicy, Error, StorageResult};
use crate::aws::{
    sigv4::{credentials::Credentials, signer::Signer},
    Client,
};

#[derive(Debug)]
pub(super) struct StorageClient {
    client: Client,
    signer: Signer,
    retry_policy: RetryPolicy,
}

impl StorageClient {
    pub fn new(credentials: Credentials, region: &str, retry_policy: RetryPolicy) -> Self {
        Self {
            client: Client::default(),
            signer: Signer::new(credentials, region),
            retry_policy,
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client.client.request(method, url)
    }

    async fn success_response(
        url: &str,
        response: reqwest::Response,
    ) -> StorageResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.map_err(Error::S3HttpError)?;
        Err(Error::from_response(url, status.as_u16(), body))
    }

    /// Signs and sends the request built by `make_request`, rebuilding it for every retry
    /// until it succeeds, fails with a terminal error or exhausts the retry budget.
    pub async fn execute<F, Fut>(&self, make_request: F) -> StorageResult<reqwest::Response>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = StorageResult<reqwest::Request>>,
    {
        let mut attempt = 0;
        loop {
            let mut request = make_request().await?;
            self.signer
                .sign(&mut request, chrono::Utc::now())
                .map_err(Error::S3CredentialsError)?;

            let method = request.method().clone();
            let url = request.url().to_string();
            tracing::debug!(%method, %url, attempt, "sending request");

            let result = match self.client.client.execute(request).await {
                Ok(response) => Self::success_response(&url, response).await,
                Err(err) => Err(Error::S3HttpError(err)),
            };

            match result {
                Err(err) if self.retry_policy.should_retry(attempt, &err) => {
                    let delay = self.retry_policy.backoff(attempt);
                    tracing::warn!(%method, %url, attempt, ?delay, error = %err, "retrying request");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn send(
        &self,
        method: Method,
        url: &Url,
        body: Option<Bytes>,
    ) -> StorageResult<reqwest::Response> {
        let (method, body) = (&method, &body);
        self.execute(move || async move {
            let request = self.request(method.clone(), url.clone());
            let request = match body {
                Some(body) => request.body(body.clone()),
                None => request,
            };
            request.build().map_err(Error::S3HttpError)
        })
        .await
    }

    pub async fn head(&self, url: &Url) -> StorageResult<()> {
        self.send(Method::HEAD, url, None).await?;
        Ok(())
    }

    pub async fn put(&self, url: &Url, body: Option<Bytes>) -> StorageResult<()> {
        self.send(Method::PUT, url, body).await?;
        Ok(())
    }

    pub async fn delete(&self, url: &Url) -> StorageResult<()> {
        self.send(Method::DELETE, url, None).await?;
        Ok(())
    }

    pub async fn get_as_xml<R>(&self, url: &Url) -> StorageResult<R>
    where
        R: DeserializeOwned,
    {
        let response = self.send(Method::GET, url, None).await?;
        let body = response.text().await.map_err(Error::S3HttpError)?;
        resources::from_xml(url.as_str(), &body)
    }
}
