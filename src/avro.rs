//! Avro codec, turning json values into Avro datums and back with [apache-avro].
//!
//! Values are resolved against the schema before writing, so json objects become records, strings
//! become enum symbols where the schema asks for an enum, missing fields with a default get the
//! default and numbers are widened where needed.
//!
//! [apache-avro]: https://crates.io/crates/apache-avro
use std::io::Cursor;

use apache_avro::schema::Name;
use apache_avro::types::Value;
use apache_avro::{from_avro_datum, to_avro_datum, Schema};
use serde_json::Value as JsonValue;

use crate::error::{ErrorKind, SRCError};

#[derive(Debug, Clone, PartialEq)]
pub struct AvroCodec {
    schema: Schema,
}

impl AvroCodec {
    pub fn new(raw: &str) -> Result<AvroCodec, SRCError> {
        match Schema::parse_str(raw) {
            Ok(schema) => Ok(AvroCodec { schema }),
            Err(e) => Err(SRCError::non_retryable_with_cause(
                ErrorKind::FailedCreateCodec,
                e,
                "Failed to create codec for Avro schema",
            )),
        }
    }

    /// Name of the record, when the schema is one.
    pub(crate) fn name(&self) -> Option<&Name> {
        match &self.schema {
            Schema::Record(record) => Some(&record.name),
            _ => None,
        }
    }

    /// Encodes json text into Avro binary, without the wire format.
    pub fn encode(&self, data: &str) -> Result<Vec<u8>, SRCError> {
        let value: JsonValue = match serde_json::from_str(data) {
            Ok(v) => v,
            Err(e) => {
                return Err(SRCError::non_retryable_with_cause(
                    ErrorKind::FailedUnmarshal,
                    e,
                    "Failed to unmarshal JSON data",
                ))
            }
        };
        self.encode_value(value)
    }

    pub fn encode_value(&self, value: JsonValue) -> Result<Vec<u8>, SRCError> {
        check_int_range(&self.schema, &value).map_err(|e| {
            SRCError::non_retryable_with_cause(
                ErrorKind::FailedEncode,
                e,
                "Failed to resolve value against the Avro schema",
            )
        })?;
        let resolved = match Value::from(value).resolve(&self.schema) {
            Ok(v) => v,
            Err(e) => {
                return Err(SRCError::non_retryable_with_cause(
                    ErrorKind::FailedEncode,
                    e,
                    "Failed to resolve value against the Avro schema",
                ))
            }
        };
        to_avro_datum(&self.schema, resolved).map_err(|e| {
            SRCError::non_retryable_with_cause(ErrorKind::FailedEncode, e, "Could not get Avro bytes")
        })
    }

    /// Decodes Avro binary, without the wire format, into a json value.
    pub fn decode(&self, bytes: &[u8]) -> Result<JsonValue, SRCError> {
        let mut reader = Cursor::new(bytes);
        let value = match from_avro_datum(&self.schema, &mut reader, None) {
            Ok(v) => v,
            Err(e) => {
                return Err(SRCError::non_retryable_with_cause(
                    ErrorKind::FailedDecode,
                    e,
                    "Could not transform bytes using schema",
                ))
            }
        };
        JsonValue::try_from(value).map_err(|e| {
            SRCError::non_retryable_with_cause(
                ErrorKind::FailedDecode,
                e,
                "Could not transform Avro value to json",
            )
        })
    }
}

// Resolving narrows a long to an int without a range check, so numbers are checked up front.
// Named references are not followed.
fn check_int_range(schema: &Schema, value: &JsonValue) -> Result<(), String> {
    match (schema, value) {
        (Schema::Int | Schema::Date | Schema::TimeMillis, JsonValue::Number(n)) => {
            match n.as_i64() {
                Some(i) if i32::try_from(i).is_err() => {
                    Err(format!("{} is out of range for an Avro int", i))
                }
                _ => Ok(()),
            }
        }
        (Schema::Record(record), JsonValue::Object(fields)) => {
            for field in &record.fields {
                if let Some(v) = fields.get(&field.name) {
                    check_int_range(&field.schema, v)
                        .map_err(|e| format!("field {}: {}", field.name, e))?;
                }
            }
            Ok(())
        }
        (Schema::Array(array), JsonValue::Array(items)) => items
            .iter()
            .try_for_each(|item| check_int_range(&array.items, item)),
        (Schema::Map(map), JsonValue::Object(values)) => values
            .values()
            .try_for_each(|v| check_int_range(&map.types, v)),
        (Schema::Union(union), _) => {
            let mut first_error = None;
            for variant in union.variants().iter().filter(|v| same_kind(v, value)) {
                match check_int_range(variant, value) {
                    Ok(()) => return Ok(()),
                    Err(e) => {
                        first_error.get_or_insert(e);
                    }
                }
            }
            first_error.map_or(Ok(()), Err)
        }
        _ => Ok(()),
    }
}

// Whether a union branch could be picked for the json value.
fn same_kind(schema: &Schema, value: &JsonValue) -> bool {
    match value {
        JsonValue::Number(_) => matches!(
            schema,
            Schema::Int
                | Schema::Long
                | Schema::Float
                | Schema::Double
                | Schema::Date
                | Schema::TimeMillis
                | Schema::TimeMicros
                | Schema::TimestampMillis
                | Schema::TimestampMicros
        ),
        JsonValue::Object(_) => matches!(schema, Schema::Record(_) | Schema::Map(_)),
        JsonValue::Array(_) => matches!(schema, Schema::Array(_)),
        _ => false,
    }
}
