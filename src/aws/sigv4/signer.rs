//! AWS Signature Version 4 request signing.
//!
//! Every request sent by the storage client goes through [`Signer::sign`], which
//! adds `x-amz-date`, `x-amz-content-sha256`, the optional `x-amz-security-token`
//! and finally the `Authorization` header computed over all of them.
//!
//! Reference: `<https://docs.aws.amazon.com/AmazonS3/latest/API/sig-v4-header-based-auth.html>`

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::{HeaderMap, HeaderValue};
use sha2::{Digest, Sha256};

use super::{credentials::Credentials, AuthResult, Error};

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";

/// Payload hash used for streamed bodies, only allowed over https or signed endpoints.
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// Everything but the unreserved characters `A-Z a-z 0-9 - _ . ~`.
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

type HmacSha256 = Hmac<Sha256>;

/// Percent encodes a single uri component (query key or value, key segment).
pub fn uri_encode(input: &str) -> String {
    percent_encoding::utf8_percent_encode(input, URI_ENCODE_SET).to_string()
}

/// Percent encodes an object key keeping its `/` separators.
pub fn uri_encode_path(input: &str) -> String {
    input.split('/').map(uri_encode).collect::<Vec<_>>().join("/")
}

pub fn sha256_hex(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn derive_signing_key(secret_key: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let date_key = hmac_sha256(format!("AWS4{secret_key}").as_bytes(), date.as_bytes());
    let date_region_key = hmac_sha256(&date_key, region.as_bytes());
    let date_region_service_key = hmac_sha256(&date_region_key, service.as_bytes());
    hmac_sha256(&date_region_service_key, b"aws4_request")
}

fn payload_hash(body: Option<&reqwest::Body>) -> String {
    match body {
        None => sha256_hex(b""),
        Some(body) => match body.as_bytes() {
            Some(bytes) => sha256_hex(bytes),
            None => UNSIGNED_PAYLOAD.to_owned(),
        },
    }
}

fn host_header(url: &reqwest::Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_owned(),
    }
}

/// Query parameters are built already encoded, only the order has to be canonicalized.
fn canonical_query_string(query: Option<&str>) -> String {
    let mut params: Vec<(&str, &str)> = query
        .unwrap_or_default()
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|param| param.split_once('=').unwrap_or((param, "")))
        .collect();
    params.sort_unstable();
    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) -> AuthResult<()> {
    let value = HeaderValue::from_str(value).map_err(|error| Error::InvalidHeaderValue {
        name: name.to_owned(),
        error,
    })?;
    headers.insert(name, value);
    Ok(())
}

#[derive(Debug, Clone)]
pub struct Signer {
    credentials: Credentials,
    region: String,
}

impl Signer {
    pub fn new(credentials: Credentials, region: &str) -> Self {
        Self {
            credentials,
            region: region.to_owned(),
        }
    }

    pub fn sign(&self, request: &mut reqwest::Request, now: DateTime<Utc>) -> AuthResult<()> {
        let timestamp = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();

        let method = request.method().as_str().to_owned();
        let host = host_header(request.url());
        let canonical_uri = match request.url().path() {
            "" => "/".to_owned(),
            path => path.to_owned(),
        };
        let canonical_query = canonical_query_string(request.url().query());
        let payload_hash = payload_hash(request.body());

        {
            let headers = request.headers_mut();
            insert_header(headers, "x-amz-date", &timestamp)?;
            insert_header(headers, "x-amz-content-sha256", &payload_hash)?;
            if let Some(token) = self.credentials.session_token() {
                insert_header(headers, "x-amz-security-token", token)?;
            }
        }

        let mut canonical_headers: BTreeMap<String, Vec<String>> = BTreeMap::new();
        canonical_headers.insert("host".to_owned(), vec![host]);
        for (name, value) in request.headers() {
            let value = String::from_utf8_lossy(value.as_bytes())
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            canonical_headers
                .entry(name.as_str().to_lowercase())
                .or_default()
                .push(value);
        }

        let signed_headers = canonical_headers
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(";");
        let canonical_headers = canonical_headers
            .iter()
            .map(|(name, values)| format!("{}:{}\n", name, values.join(",")))
            .collect::<String>();

        let canonical_request = format!(
            "{method}\n{canonical_uri}\n{canonical_query}\n{canonical_headers}\n{signed_headers}\n{payload_hash}"
        );

        let scope = format!("{}/{}/{}/aws4_request", date, self.region, SERVICE);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            timestamp,
            scope,
            sha256_hex(canonical_request.as_bytes())
        );
        let signing_key = derive_signing_key(
            self.credentials.secret_access_key(),
            &date,
            &self.region,
            SERVICE,
        );
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

        let authorization = format!(
            "{} Credential={}/{},SignedHeaders={},Signature={}",
            ALGORITHM,
            self.credentials.access_key_id(),
            scope,
            signed_headers,
            signature
        );
        tracing::trace!(%canonical_request, %string_to_sign, "signed request");
        insert_header(request.headers_mut(), "authorization", &authorization)
    }
}
