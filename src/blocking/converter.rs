//! The entry points, combining subject names, the registry, the cache and the codecs.
//!
//! ```
//! use schema_registry_serde::blocking::converter::SchemaRegistryConverter;
//! use schema_registry_serde::config::{SchemaRegistryConfiguration, SerdeConfig};
//! use schema_registry_serde::schema_registry_common::{Element, SchemaType};
//!
//! // Without registry url nothing is fetched or registered and the schema id is 0.
//! let config = SerdeConfig::new(SchemaType::Json, SchemaRegistryConfiguration::default());
//! let converter = SchemaRegistryConverter::new(config).unwrap();
//! let schema = r#"{"type":"object","properties":{"field":{"type":"string"}}}"#;
//! let bytes = converter
//!     .serialize("topic", r#"{"field":"value"}"#, Element::Value, schema, 0)
//!     .unwrap();
//! assert_eq!(&[0, 0, 0, 0, 0], &bytes[..5]);
//! let value = converter
//!     .deserialize("topic", &bytes, Element::Value, schema, 0)
//!     .unwrap();
//! assert_eq!("value", value["field"]);
//! ```
use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use serde_json::Value;

use crate::blocking::schema_cache::SchemaCache;
use crate::blocking::schema_registry::{SchemaRegistry, SrClient};
use crate::codec::FormatCodec;
use crate::config::SerdeConfig;
use crate::error::{ErrorKind, SRCError};
use crate::schema_registry_common::{
    decode_wire_format, encode_wire_format, Element, RegisteredSchema, SchemaType,
};
use crate::subject_name::get_subject;

/// Serializes and deserializes one format, as set in the configuration. Can be shared between
/// threads, all state lives in the cache.
pub struct SchemaRegistryConverter {
    config: SerdeConfig,
    registry: Option<Arc<dyn SchemaRegistry>>,
    cache: Arc<SchemaCache>,
}

impl fmt::Debug for SchemaRegistryConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRegistryConverter")
            .field("config", &self.config)
            .field("online", &self.registry.is_some())
            .field("cached_schemas", &self.cache.len())
            .finish()
    }
}

impl SchemaRegistryConverter {
    /// Creates a converter using the process wide cache. When the configuration has a registry
    /// url a client is built for it, which fails when TLS was asked for but can't be set up.
    pub fn new(config: SerdeConfig) -> Result<SchemaRegistryConverter, SRCError> {
        let registry: Option<Arc<dyn SchemaRegistry>> = if config.schema_registry.is_offline() {
            debug!("no schema registry url configured, working without registry");
            None
        } else {
            Some(Arc::new(SrClient::from_configuration(
                &config.schema_registry,
            )?))
        };
        Ok(SchemaRegistryConverter {
            config,
            registry,
            cache: SchemaCache::global(),
        })
    }

    /// Creates a converter that always uses the given registry and cache, whatever the url in
    /// the configuration is.
    pub fn with_registry(
        config: SerdeConfig,
        registry: Arc<dyn SchemaRegistry>,
        cache: Arc<SchemaCache>,
    ) -> SchemaRegistryConverter {
        SchemaRegistryConverter {
            config,
            registry: Some(registry),
            cache,
        }
    }

    pub fn config(&self) -> &SerdeConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<SchemaCache> {
        &self.cache
    }

    /// Encodes the json `data` with the configured format and puts it in the wire format.
    ///
    /// With a registry, a non empty `schema` is registered for the subject unless `use_latest` is
    /// set. Registering happens again only when the schema differs from the one last registered
    /// for the subject. Without a supplied schema, or with `use_latest`, the schema is fetched
    /// instead, at `version` or the latest one when `version` is 0. The supplied schema is what
    /// the data is encoded with; only when none is supplied the registry's schema is used.
    pub fn serialize(
        &self,
        topic: &str,
        data: &str,
        element: Element,
        schema: &str,
        version: u32,
    ) -> Result<Vec<u8>, SRCError> {
        let subject = get_subject(
            topic,
            element,
            &self.config.subject_name_strategy,
            schema,
        )?;
        let registered = match &self.registry {
            None => None,
            Some(registry) => {
                let registered = if !schema.is_empty() && !self.config.schema_registry.use_latest
                {
                    self.cache
                        .register(registry.as_ref(), &subject, schema, self.config.format)?
                } else {
                    self.cache.resolve(registry.as_ref(), &subject, version)?
                };
                Some(registered)
            }
        };
        let codec = self.codec(schema, registered.as_deref(), FormatCodec::new)?;
        let payload = codec.encode(data)?;
        let id = registered.map(|r| r.id).unwrap_or(0);
        debug!(
            "serialized {} of type {} for subject {} with schema id {}",
            element,
            codec.type_name().as_deref().unwrap_or("-"),
            subject,
            id
        );
        Ok(encode_wire_format(&payload, id))
    }

    /// Removes the wire format and decodes the rest with the configured format.
    ///
    /// With a registry the schema is fetched by the id in the message, or by subject when
    /// `use_latest` is set. The supplied `schema` takes precedence over the fetched one for
    /// decoding.
    pub fn deserialize(
        &self,
        topic: &str,
        message: &[u8],
        element: Element,
        schema: &str,
        version: u32,
    ) -> Result<Value, SRCError> {
        let (id, payload) = decode_wire_format(message).map_err(|e| {
            e.wrap(
                ErrorKind::FailedDecodeFromWireFormat,
                "Failed to remove wire format from the binary data",
            )
        })?;
        let registered = match &self.registry {
            None => None,
            Some(registry) if self.config.schema_registry.use_latest => {
                let subject = get_subject(
                    topic,
                    element,
                    &self.config.subject_name_strategy,
                    schema,
                )?;
                Some(self.cache.resolve(registry.as_ref(), &subject, version)?)
            }
            Some(registry) => Some(self.cache.resolve_by_id(registry.as_ref(), id)?),
        };
        let codec = self.codec(schema, registered.as_deref(), FormatCodec::for_decoding)?;
        debug!("deserializing {} with schema id {}", element, id);
        codec.decode(payload)
    }

    fn codec(
        &self,
        schema: &str,
        registered: Option<&RegisteredSchema>,
        create: fn(SchemaType, &str) -> Result<FormatCodec, SRCError>,
    ) -> Result<FormatCodec, SRCError> {
        if let Some(registered) = registered {
            if registered.schema_type != self.config.format {
                warn!(
                    "schema with id {} has type {} but the configured format is {}",
                    registered.id, registered.schema_type, self.config.format
                );
            }
        }
        let raw = match (schema.is_empty(), registered) {
            (false, _) => schema,
            (true, Some(registered)) => registered.schema.as_str(),
            (true, None) => {
                return Err(SRCError::non_retryable_without_cause(
                    ErrorKind::FailedCreateCodec,
                    "No schema supplied and no schema registry to get it from",
                ))
            }
        };
        create(self.config.format, raw)
    }
}
