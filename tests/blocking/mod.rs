use std::sync::Arc;

use schema_registry_serde::blocking::converter::SchemaRegistryConverter;
use schema_registry_serde::blocking::schema_cache::SchemaCache;
use schema_registry_serde::blocking::schema_registry::SrClient;
use schema_registry_serde::config::{SchemaRegistryConfiguration, SerdeConfig};
use schema_registry_serde::schema_registry_common::SchemaType;

pub mod avro_tests;
pub mod json_tests;
pub mod proto_tests;
pub mod schema_registry_calls;

/// Converter against the given registry with its own cache, so tests don't see each others
/// schemas.
pub fn converter(
    format: SchemaType,
    url: &str,
    strategy: &str,
    use_latest: bool,
) -> SchemaRegistryConverter {
    let mut config = SerdeConfig::new(format, SchemaRegistryConfiguration::with_url(url));
    config.subject_name_strategy = String::from(strategy);
    config.schema_registry.use_latest = use_latest;
    let client = SrClient::from_configuration(&config.schema_registry).unwrap();
    SchemaRegistryConverter::with_registry(config, Arc::new(client), Arc::new(SchemaCache::new()))
}
