//! Configuration as handed over by the caller, usually parsed from json.
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, SRCError};
use crate::schema_registry_common::{SchemaType, DEFAULT_CONCURRENT_REQUESTS};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Everything needed to serialize or deserialize one kind of element.
/// ```
/// use schema_registry_serde::config::SerdeConfig;
/// use schema_registry_serde::schema_registry_common::SchemaType;
///
/// let config = SerdeConfig::from_json(
///     r#"{"subjectNameStrategy":"RecordNameStrategy","schemaRegistry":{"url":"http://localhost:8081"},"format":"AVRO"}"#,
/// ).unwrap();
/// assert_eq!(SchemaType::Avro, config.format);
/// assert_eq!(16, config.schema_registry.concurrent_requests);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SerdeConfig {
    /// One of `""`, `"TopicNameStrategy"`, `"RecordNameStrategy"` or
    /// `"TopicRecordNameStrategy"`.
    #[serde(default)]
    pub subject_name_strategy: String,
    #[serde(default)]
    pub schema_registry: SchemaRegistryConfiguration,
    pub format: SchemaType,
}

impl SerdeConfig {
    pub fn new(format: SchemaType, schema_registry: SchemaRegistryConfiguration) -> SerdeConfig {
        SerdeConfig {
            subject_name_strategy: String::new(),
            schema_registry,
            format,
        }
    }

    pub fn from_json(json: &str) -> Result<SerdeConfig, SRCError> {
        serde_json::from_str(json).map_err(|e| {
            SRCError::non_retryable_with_cause(
                ErrorKind::InvalidConfiguration,
                e,
                "could not read serde configuration",
            )
        })
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

/// How to reach the schema registry. An empty url means no registry is used at all.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SchemaRegistryConfiguration {
    pub url: String,
    pub basic_auth: BasicAuth,
    /// Fetch the latest schema for the subject instead of registering the supplied one, and
    /// decode using the subject instead of the id in the bytes.
    pub use_latest: bool,
    pub tls: TlsConfig,
    pub concurrent_requests: usize,
    pub timeout_secs: u64,
}

impl Default for SchemaRegistryConfiguration {
    fn default() -> Self {
        SchemaRegistryConfiguration {
            url: String::new(),
            basic_auth: BasicAuth::default(),
            use_latest: false,
            tls: TlsConfig::default(),
            concurrent_requests: DEFAULT_CONCURRENT_REQUESTS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl SchemaRegistryConfiguration {
    pub fn with_url(url: &str) -> SchemaRegistryConfiguration {
        SchemaRegistryConfiguration {
            url: String::from(url),
            ..Default::default()
        }
    }

    pub fn is_offline(&self) -> bool {
        self.url.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum TlsVersion {
    #[serde(rename = "TLSv1.0", alias = "1.0")]
    Tls10,
    #[serde(rename = "TLSv1.1", alias = "1.1")]
    Tls11,
    #[serde(rename = "TLSv1.2", alias = "1.2")]
    Tls12,
    #[serde(rename = "TLSv1.3", alias = "1.3")]
    Tls13,
}

/// TLS settings for the connection to the schema registry. The pem fields are paths to files.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TlsConfig {
    pub enable_tls: bool,
    pub insecure_skip_tls_verify: bool,
    pub min_version: Option<TlsVersion>,
    pub client_cert_pem: String,
    pub client_key_pem: String,
    pub server_ca_pem: String,
}
