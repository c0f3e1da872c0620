//! `[storage.*]` backend settings.
//!
//! # Example
//!
//! ```toml
//! [storage.s3]
//! region = "eu-west-1"                    # Default: $AWS_REGION, then us-east-1
//! endpoint = "http://localhost:9000"      # S3-compatible endpoint, path-style
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSectionConfig {
    pub s3: S3Config,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct S3Config {
    pub region: Option<String>,
    pub endpoint: Option<String>,
}

pub struct S3Fields {
    pub region: FieldPath,
    pub endpoint: FieldPath,
}

impl S3Config {
    pub const FIELDS: S3Fields = S3Fields {
        region: FieldPath::new("storage.s3.region"),
        endpoint: FieldPath::new("storage.s3.endpoint"),
    };

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if let Some(region) = &self.region
            && region.trim().is_empty()
        {
            diag.error(Self::FIELDS.region, "region is empty");
        }

        if let Some(endpoint) = &self.endpoint {
            match url::Url::parse(endpoint) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {}
                Ok(url) => diag.error(
                    Self::FIELDS.endpoint,
                    format!("unsupported endpoint scheme `{}`", url.scheme()),
                ),
                Err(e) => diag.error_with_hint(
                    Self::FIELDS.endpoint,
                    format!("invalid endpoint `{endpoint}`: {e}"),
                    "use a full URL such as `https://s3.example.com`",
                ),
            }
        }
    }
}
