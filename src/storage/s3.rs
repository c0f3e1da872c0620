//! S3-compatible object store backend.
//!
//! Objects are written with a signed `PUT` (AWS Signature V4), made public
//! with `x-amz-acl: public-read`, and always overwritten. Keys are
//! content-addressed, so an overwrite only ever replaces identical bytes.

use std::collections::BTreeMap;

use chrono::Utc;
use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use url::Url;

use super::sign::{self, SigningRequest};
use super::{Committed, Storage, StorageError, StorageOptions};
use crate::pipeline::StorageHeaders;

pub const ACCESS_KEY_VAR: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_KEY_VAR: &str = "AWS_SECRET_ACCESS_KEY";
pub const SESSION_TOKEN_VAR: &str = "AWS_SESSION_TOKEN";
pub const REGION_VARS: &[&str] = &["AWS_REGION", "AWS_DEFAULT_REGION"];
pub const DEFAULT_REGION: &str = "us-east-1";

const SERVICE: &str = "s3";

/// Access credentials.
#[derive(Clone)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
    pub session_token: Option<String>,
}

impl Credentials {
    /// Read credentials from the process environment.
    pub fn from_env() -> Result<Self, StorageError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through `lookup`. Empty values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StorageError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let access_key = get(ACCESS_KEY_VAR).ok_or(StorageError::MissingCredential(ACCESS_KEY_VAR))?;
        let secret_key = get(SECRET_KEY_VAR).ok_or(StorageError::MissingCredential(SECRET_KEY_VAR))?;
        Ok(Self {
            access_key,
            secret_key,
            session_token: get(SESSION_TOKEN_VAR),
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .finish_non_exhaustive()
    }
}

/// Resolved request target for one key.
#[derive(Debug, PartialEq, Eq)]
struct Target {
    url: String,
    host: String,
    canonical_uri: String,
}

#[derive(Debug)]
pub struct S3Storage {
    bucket: String,
    region: String,
    endpoint: Option<Url>,
    credentials: Credentials,
    client: Option<Client>,
}

impl S3Storage {
    pub fn new(
        bucket: &str,
        credentials: Credentials,
        options: &StorageOptions,
    ) -> Result<Self, StorageError> {
        if bucket.trim().is_empty() {
            return Err(StorageError::Config("bucket name is empty".into()));
        }

        let endpoint = options
            .endpoint
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .map(|e| {
                Url::parse(e).map_err(|err| StorageError::Config(format!("endpoint `{e}`: {err}")))
            })
            .transpose()?;

        let region = options
            .region
            .clone()
            .or_else(|| REGION_VARS.iter().find_map(|v| std::env::var(v).ok()))
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let client = Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| StorageError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            bucket: bucket.to_string(),
            region,
            endpoint,
            credentials,
            client: Some(client),
        })
    }

    #[cfg(test)]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Virtual-hosted style on AWS, path style on custom endpoints.
    fn target(&self, key: &str) -> Target {
        let encoded = sign::encode_key(key.trim_start_matches('/'));
        match &self.endpoint {
            Some(endpoint) => {
                let host = match (endpoint.host_str(), endpoint.port()) {
                    (Some(h), Some(p)) => format!("{h}:{p}"),
                    (Some(h), None) => h.to_string(),
                    (None, _) => String::new(),
                };
                let base = endpoint.path().trim_end_matches('/');
                let canonical_uri = format!("{}/{}/{}", base, sign::encode_key(&self.bucket), encoded);
                Target {
                    url: format!("{}://{}{}", endpoint.scheme(), host, canonical_uri),
                    host,
                    canonical_uri,
                }
            }
            None => {
                let host = format!("{}.s3.{}.amazonaws.com", self.bucket, self.region);
                let canonical_uri = format!("/{encoded}");
                Target {
                    url: format!("https://{host}{canonical_uri}"),
                    host,
                    canonical_uri,
                }
            }
        }
    }

    /// Headers that go on the wire, all of them signed.
    fn request_headers(
        &self,
        target: &Target,
        headers: &StorageHeaders,
        payload_hash: &str,
        amz_date: &str,
    ) -> BTreeMap<String, String> {
        let mut signed: BTreeMap<String, String> = headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        signed.insert("host".into(), target.host.clone());
        signed.insert("x-amz-acl".into(), "public-read".into());
        signed.insert("x-amz-content-sha256".into(), payload_hash.to_string());
        signed.insert("x-amz-date".into(), amz_date.to_string());
        if let Some(token) = &self.credentials.session_token {
            signed.insert("x-amz-security-token".into(), token.clone());
        }
        signed
    }
}

impl Storage for S3Storage {
    fn upload(
        &mut self,
        content: &[u8],
        key: &str,
        headers: &StorageHeaders,
    ) -> Result<Committed, StorageError> {
        let client = self.client.as_ref().ok_or(StorageError::Closed)?;

        let target = self.target(key);
        let payload_hash = sign::sha256_hex(content);
        let amz_date = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
        let signed = self.request_headers(&target, headers, &payload_hash, &amz_date);

        let auth = sign::authorization(
            &self.credentials.access_key,
            &self.credentials.secret_key,
            &SigningRequest {
                method: "PUT",
                canonical_uri: &target.canonical_uri,
                headers: &signed,
                payload_hash: &payload_hash,
                amz_date: &amz_date,
                region: &self.region,
                service: SERVICE,
            },
        );

        // reqwest derives `host` from the URL
        let mut request = client.put(&target.url).body(content.to_vec());
        for (name, value) in signed.iter().filter(|(k, _)| k.as_str() != "host") {
            request = request.header(name.as_str(), value.as_str());
        }
        request = request.header(AUTHORIZATION, auth);

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                StorageError::Timeout {
                    url: target.url.clone(),
                }
            } else {
                StorageError::Transport {
                    url: target.url.clone(),
                    source: e,
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(StorageError::Rejected {
                key: key.to_string(),
                status: status.as_u16(),
                body: body.chars().take(512).collect(),
            });
        }

        Ok(Committed::written(target.url))
    }

    fn close(&mut self) -> Result<(), StorageError> {
        self.client = None;
        Ok(())
    }

    fn describe(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => format!("s3://{} via {}", self.bucket, endpoint),
            None => format!("s3://{} ({})", self.bucket, self.region),
        }
    }
}
