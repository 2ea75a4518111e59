//! Rust encoders and decoders for payloads governed by a Confluent compatible schema registry.
//!
//! Every payload is put in the wire format, a zero byte followed by the schema id as a big endian
//! `u32` and then the encoded data. Avro, JSON Schema and Protobuf are supported, values are
//! handed over as json text and given back as [`serde_json::Value`].
//!
//! The calls to the schema registry are blocking, and the results are cached per subject and per
//! id. When no registry url is configured no calls are done at all; the supplied schema is used to
//! encode and the schema id in the wire format will be 0.
//!
//! # Example
//! ```no_run
//! use schema_registry_serde::blocking::converter::SchemaRegistryConverter;
//! use schema_registry_serde::config::SerdeConfig;
//! use schema_registry_serde::schema_registry_common::Element;
//!
//! let config = SerdeConfig::from_json(
//!     r#"{"schemaRegistry":{"url":"http://localhost:8081"},"format":"AVRO"}"#,
//! ).unwrap();
//! let converter = SchemaRegistryConverter::new(config).unwrap();
//! let schema = r#"{"type":"record","name":"Heartbeat","namespace":"nl.openweb.data","fields":[{"name":"beat","type":"long"}]}"#;
//! let bytes = converter.serialize("heartbeats", r#"{"beat":3}"#, Element::Value, schema, 0).unwrap();
//! let value = converter.deserialize("heartbeats", &bytes, Element::Value, "", 0).unwrap();
//! assert_eq!(3, value["beat"]);
//! ```
//!
//! Logging goes through the [`log`](https://crates.io/crates/log) facade, nothing is printed
//! unless the application installs a logger.

pub mod avro;
pub mod blocking;
pub mod codec;
pub mod config;
pub mod error;
pub mod json;
pub mod proto;
pub mod schema_registry_common;
pub mod subject_name;
mod tls;
