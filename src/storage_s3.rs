//! S3-compatible object storage.
//!
//! Uploads photos with a single `PutObject` request to the S3 REST API, signed
//! with AWS Signature V4. Works against AWS S3 and S3-compatible services
//! (MinIO, LocalStack, the Supabase storage S3 endpoint) through
//! `endpoint_url`.
//!
//! Uses only pure-Rust dependencies (`hmac`, `sha2`) for signing.
//!
//! # Configuration
//!
//! ```toml
//! [storage]
//! backend = "s3"
//! bucket = "item-images"
//! key_prefix = "public/"
//! region = "us-east-1"
//! # endpoint_url = "http://localhost:9000"   # MinIO
//! # public_base_url = "https://cdn.example.edu"
//! ```
//!
//! # Environment Variables
//!
//! - `AWS_ACCESS_KEY_ID`: required
//! - `AWS_SECRET_ACCESS_KEY`: required
//! - `AWS_SESSION_TOKEN`: optional (temporary credentials / IAM roles)
//!
//! # Addressing
//!
//! | Setup | Object URL |
//! |---|---|
//! | AWS (default) | `https://<bucket>.s3.<region>.amazonaws.com/<key>` |
//! | Custom endpoint | `<endpoint>/<bucket>/<key>` (path-style; any endpoint path is kept) |
//!
//! Public URLs use `public_base_url` when set (`<base>/<bucket>/<key>`),
//! otherwise the object URL above.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::time::Duration;

use crate::config::StorageConfig;
use crate::image::detect_content_type;
use crate::traits::ObjectStorage;

type HmacSha256 = Hmac<Sha256>;

/// AWS credentials loaded from environment variables.
#[derive(Clone)]
pub struct AwsCredentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl AwsCredentials {
    pub fn new(access_key_id: String, secret_access_key: String, session_token: Option<String>) -> Self {
        Self {
            access_key_id,
            secret_access_key,
            session_token,
        }
    }

    /// Load credentials from `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`,
    /// and optionally `AWS_SESSION_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let access_key_id = std::env::var("AWS_ACCESS_KEY_ID")
            .context("AWS_ACCESS_KEY_ID environment variable not set")?;
        let secret_access_key = std::env::var("AWS_SECRET_ACCESS_KEY")
            .context("AWS_SECRET_ACCESS_KEY environment variable not set")?;
        let session_token = std::env::var("AWS_SESSION_TOKEN").ok();

        Ok(Self::new(access_key_id, secret_access_key, session_token))
    }
}

/// Custom endpoint split into the parts SigV4 signs separately.
struct Endpoint {
    scheme: String,
    /// Host plus a non-default port, exactly as sent in the `Host` header.
    host: String,
    /// Path prefix without a trailing slash, e.g. `/storage/v1/s3`.
    base_path: String,
}

impl Endpoint {
    fn parse(raw: &str) -> Result<Self> {
        let url = reqwest::Url::parse(raw)
            .with_context(|| format!("Invalid storage.endpoint_url: '{}'", raw))?;
        let host = url
            .host_str()
            .ok_or_else(|| anyhow::anyhow!("storage.endpoint_url has no host: '{}'", raw))?;
        let host = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        Ok(Self {
            scheme: url.scheme().to_string(),
            host,
            base_path: url.path().trim_end_matches('/').to_string(),
        })
    }
}

/// Where a single object lives.
struct ObjectLocation {
    scheme: String,
    host: String,
    /// URI-encoded absolute path, used both in the URL and the canonical request.
    canonical_uri: String,
}

impl ObjectLocation {
    fn url(&self) -> String {
        format!("{}://{}{}", self.scheme, self.host, self.canonical_uri)
    }
}

/// [`ObjectStorage`] backed by an S3-compatible bucket.
pub struct S3ObjectStorage {
    client: reqwest::Client,
    creds: AwsCredentials,
    region: String,
    endpoint: Option<Endpoint>,
    public_base_url: Option<String>,
}

impl S3ObjectStorage {
    /// Build from `[storage]` with credentials from the environment.
    pub fn new(config: &StorageConfig) -> Result<Self> {
        Self::with_credentials(config, AwsCredentials::from_env()?)
    }

    pub fn with_credentials(config: &StorageConfig, creds: AwsCredentials) -> Result<Self> {
        let endpoint = config
            .endpoint_url
            .as_deref()
            .map(Endpoint::parse)
            .transpose()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            creds,
            region: config.region.clone(),
            endpoint,
            public_base_url: config.public_base_url.clone(),
        })
    }

    fn locate(&self, bucket: &str, key: &str) -> ObjectLocation {
        let encoded_key = key.split('/').map(uri_encode).collect::<Vec<_>>().join("/");

        if let Some(ref endpoint) = self.endpoint {
            // Custom endpoint (MinIO, LocalStack, Supabase), path-style
            ObjectLocation {
                scheme: endpoint.scheme.clone(),
                host: endpoint.host.clone(),
                canonical_uri: format!(
                    "{}/{}/{}",
                    endpoint.base_path,
                    uri_encode(bucket),
                    encoded_key
                ),
            }
        } else {
            ObjectLocation {
                scheme: "https".to_string(),
                host: format!("{}.s3.{}.amazonaws.com", bucket, self.region),
                canonical_uri: format!("/{}", encoded_key),
            }
        }
    }

    /// Produce the `Authorization` header for a request and add the signed
    /// `x-amz-*` headers to `headers`.
    fn sign(
        &self,
        method: &str,
        location: &ObjectLocation,
        headers: &mut Vec<(String, String)>,
        payload_hash: &str,
        now: DateTime<Utc>,
    ) -> String {
        let date_stamp = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();

        headers.push(("host".to_string(), location.host.clone()));
        headers.push(("x-amz-content-sha256".to_string(), payload_hash.to_string()));
        headers.push(("x-amz-date".to_string(), amz_date.clone()));
        if let Some(ref token) = self.creds.session_token {
            headers.push(("x-amz-security-token".to_string(), token.clone()));
        }
        headers.sort_by(|a, b| a.0.cmp(&b.0));

        let signed_headers: String = headers
            .iter()
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>()
            .join(";");

        let canonical_headers: String = headers
            .iter()
            .map(|(k, v)| format!("{}:{}\n", k, v.trim()))
            .collect();

        let canonical_request = format!(
            "{}\n{}\n\n{}\n{}\n{}",
            method, location.canonical_uri, canonical_headers, signed_headers, payload_hash
        );

        let credential_scope = format!("{}/{}/s3/aws4_request", date_stamp, self.region);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date,
            credential_scope,
            hex_sha256(canonical_request.as_bytes())
        );

        let signing_key =
            derive_signing_key(&self.creds.secret_access_key, &date_stamp, &self.region, "s3");
        let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes());

        format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            self.creds.access_key_id, credential_scope, signed_headers, signature
        )
    }
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn upload(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<()> {
        let location = self.locate(bucket, key);
        let payload_hash = hex_sha256(&bytes);

        let mut headers = vec![(
            "content-type".to_string(),
            detect_content_type(key).to_string(),
        )];
        let authorization = self.sign("PUT", &location, &mut headers, &payload_hash, Utc::now());

        let mut req_builder = self
            .client
            .put(location.url())
            .header("Authorization", &authorization);
        for (name, value) in headers.iter().filter(|(k, _)| k != "host") {
            req_builder = req_builder.header(name.as_str(), value.as_str());
        }

        let resp = req_builder
            .body(bytes)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to upload s3://{}/{}: {}", bucket, key, e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!(
                "S3 PutObject failed (HTTP {}) for key '{}': {}",
                status,
                key,
                body.chars().take(500).collect::<String>()
            );
        }

        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        match self.public_base_url {
            Some(ref base) => format!("{}/{}/{}", base.trim_end_matches('/'), bucket, key),
            None => self.locate(bucket, key).url(),
        }
    }
}

// ============ AWS SigV4 Helpers ============

/// Compute the hex-encoded SHA-256 hash of data.
fn hex_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compute HMAC-SHA256 of data with the given key.
fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn hex_hmac_sha256(key: &[u8], data: &[u8]) -> String {
    hex::encode(hmac_sha256(key, data))
}

/// Derive the AWS SigV4 signing key for a given date, region, and service.
///
/// ```text
/// kDate    = HMAC("AWS4" + secret, dateStamp)
/// kRegion  = HMAC(kDate, region)
/// kService = HMAC(kRegion, service)
/// kSigning = HMAC(kService, "aws4_request")
/// ```
fn derive_signing_key(secret_key: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(
        format!("AWS4{}", secret_key).as_bytes(),
        date_stamp.as_bytes(),
    );
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

/// URI-encode a path segment per RFC 3986.
///
/// Encodes all characters except `A-Z a-z 0-9 - _ . ~`.
fn uri_encode(s: &str) -> String {
    let mut result = String::new();
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                result.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    result
}
