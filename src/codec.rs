//! One codec type for all supported formats, picked by the configured [`SchemaType`].
use serde_json::Value;

use crate::avro::AvroCodec;
use crate::error::SRCError;
use crate::json::JsonCodec;
use crate::proto::ProtoCodec;
use crate::schema_registry_common::SchemaType;

#[derive(Debug)]
pub enum FormatCodec {
    Avro(AvroCodec),
    Json(JsonCodec),
    Protobuf(ProtoCodec),
}

impl FormatCodec {
    pub fn new(schema_type: SchemaType, raw: &str) -> Result<FormatCodec, SRCError> {
        Ok(match schema_type {
            SchemaType::Avro => FormatCodec::Avro(AvroCodec::new(raw)?),
            SchemaType::Json => FormatCodec::Json(JsonCodec::new(raw)?),
            SchemaType::Protobuf => FormatCodec::Protobuf(ProtoCodec::new(raw)?),
        })
    }

    /// Like [`FormatCodec::new`], with errors worded for the decoding side.
    pub fn for_decoding(schema_type: SchemaType, raw: &str) -> Result<FormatCodec, SRCError> {
        match schema_type {
            SchemaType::Json => Ok(FormatCodec::Json(JsonCodec::for_decoding(raw)?)),
            _ => FormatCodec::new(schema_type, raw),
        }
    }

    pub fn schema_type(&self) -> SchemaType {
        match self {
            FormatCodec::Avro(_) => SchemaType::Avro,
            FormatCodec::Json(_) => SchemaType::Json,
            FormatCodec::Protobuf(_) => SchemaType::Protobuf,
        }
    }

    /// Full name of the record or message the codec writes. JSON schemas have none.
    pub fn type_name(&self) -> Option<String> {
        match self {
            FormatCodec::Avro(c) => c.name().map(|name| name.fullname(None)),
            FormatCodec::Json(_) => None,
            FormatCodec::Protobuf(c) => c.full_name(),
        }
    }

    pub fn encode(&self, data: &str) -> Result<Vec<u8>, SRCError> {
        match self {
            FormatCodec::Avro(c) => c.encode(data),
            FormatCodec::Json(c) => c.encode(data),
            FormatCodec::Protobuf(c) => c.encode(data),
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Value, SRCError> {
        match self {
            FormatCodec::Avro(c) => c.decode(bytes),
            FormatCodec::Json(c) => c.decode(bytes),
            FormatCodec::Protobuf(c) => c.decode(bytes),
        }
    }
}
