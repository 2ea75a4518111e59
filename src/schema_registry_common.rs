//! Contains structs, enums' and functions common to the registry client, the cache and the
//! codecs. So stuff dealing with the responses from schema registry, the calls made to it and the
//! wire format wrapped around every payload.
use core::fmt;
use std::str::FromStr;

use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, SRCError};

/// The magic byte every schema registry payload starts with.
pub const MAGIC_BYTE: u8 = 0;
/// Magic byte plus the 4 byte schema id.
pub const WIRE_PREFIX_SIZE: usize = 5;
/// Default cap on the amount of calls to the schema registry that can be in flight at once.
pub const DEFAULT_CONCURRENT_REQUESTS: usize = 16;

#[derive(Clone)]
pub(crate) enum SrAuthorization {
    None,
    Basic(String, Option<String>),
}

impl fmt::Debug for SrAuthorization {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SrAuthorization::None => write!(f, "None"),
            SrAuthorization::Basic(_, _) => write!(f, "Basic"),
        }
    }
}

/// The three types supported by the schema registry. Also used in configuration to select which
/// codec is used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaType {
    #[serde(rename = "AVRO", alias = "Avro", alias = "avro")]
    Avro,
    #[serde(rename = "PROTOBUF", alias = "Protobuf", alias = "protobuf")]
    Protobuf,
    #[serde(rename = "JSON", alias = "Json", alias = "json")]
    Json,
}

impl SchemaType {
    /// The name the schema registry uses for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Avro => "AVRO",
            SchemaType::Protobuf => "PROTOBUF",
            SchemaType::Json => "JSON",
        }
    }
}

impl FromStr for SchemaType {
    type Err = SRCError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AVRO" => Ok(SchemaType::Avro),
            "PROTOBUF" => Ok(SchemaType::Protobuf),
            "JSON" => Ok(SchemaType::Json),
            other => Err(SRCError::non_retryable_without_cause(
                ErrorKind::SchemaNotFound,
                &format!("schema type {} is not supported", other),
            )),
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which half of a kafka record a schema applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Key,
    Value,
}

impl Element {
    pub fn as_str(&self) -> &'static str {
        match self {
            Element::Key => "key",
            Element::Value => "value",
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema as retrieved from the schema registry. It's close to the json received and doesn't do
/// type specific transformations. When fetched by id the registry doesn't tell the subject or
/// version, so those are optional.
#[derive(Clone, Debug, PartialEq)]
pub struct RegisteredSchema {
    pub id: u32,
    pub subject: Option<String>,
    pub version: Option<u32>,
    pub schema_type: SchemaType,
    pub schema: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRegisteredSchema {
    pub subject: Option<String>,
    pub version: Option<u32>,
    pub id: Option<u32>,
    pub schema_type: Option<String>,
    pub schema: Option<String>,
}

impl RawRegisteredSchema {
    /// Turns the response into a [`RegisteredSchema`]. The id is supplied when the call was done
    /// by id, since the response won't contain it then. A missing schema type means Avro, that is
    /// how the registry stays compatible with clients from before it supported other types.
    pub(crate) fn into_registered(
        self,
        id: Option<u32>,
        kind: ErrorKind,
    ) -> Result<RegisteredSchema, SRCError> {
        let id = match id.or(self.id) {
            Some(v) => v,
            None => {
                return Err(SRCError::non_retryable_without_cause(
                    kind,
                    "Could not get id from response",
                ))
            }
        };
        let schema_type = match self.schema_type {
            Some(s) => SchemaType::from_str(&s).map_err(|e| e.with_kind(kind))?,
            None => SchemaType::Avro,
        };
        let schema = match self.schema {
            Some(v) => v,
            None => {
                return Err(SRCError::non_retryable_without_cause(
                    kind,
                    "Could not get raw schema from response",
                ))
            }
        };
        Ok(RegisteredSchema {
            id,
            subject: self.subject,
            version: self.version,
            schema_type,
            schema,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub enum SrCall<'a> {
    GetById(u32),
    GetLatest(&'a str),
    GetBySubjectAndVersion(&'a str, u32),
    PostNew(&'a str, &'a str),
    PostForVersion(&'a str, &'a str),
}

impl SrCall<'_> {
    /// The kind of error a failure of this call is reported as.
    pub(crate) fn error_kind(&self) -> ErrorKind {
        match self {
            SrCall::GetById(_) | SrCall::GetLatest(_) | SrCall::GetBySubjectAndVersion(_, _) => {
                ErrorKind::SchemaNotFound
            }
            SrCall::PostNew(_, _) | SrCall::PostForVersion(_, _) => {
                ErrorKind::SchemaCreationFailed
            }
        }
    }
}

pub(crate) fn url_for_call(call: &SrCall, base_url: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    match call {
        SrCall::GetById(id) => format!("{}/schemas/ids/{}?deleted=true", base_url, id),
        SrCall::GetLatest(subject) => {
            format!("{}/subjects/{}/versions/latest", base_url, escape(subject))
        }
        SrCall::GetBySubjectAndVersion(subject, version) => {
            format!("{}/subjects/{}/versions/{}", base_url, escape(subject), version)
        }
        SrCall::PostNew(subject, _) => {
            format!("{}/subjects/{}/versions", base_url, escape(subject))
        }
        SrCall::PostForVersion(subject, _) => {
            format!("{}/subjects/{}?deleted=false", base_url, escape(subject))
        }
    }
}

// Use escape sequences instead of slashes in the subject
fn escape(subject: &str) -> String {
    subject.replace('/', "%2F")
}

/// Creates payload that can be included as a key or value on a kafka record. The way schema
/// registry messages are encoded is starting with a zero, with the next 4 bytes having the id in
/// big endian. The other bytes are the encoded message.
pub fn encode_wire_format(payload: &[u8], id: u32) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(WIRE_PREFIX_SIZE + payload.len());
    bytes.push(MAGIC_BYTE);
    let mut buf = [0u8; 4];
    BigEndian::write_u32(&mut buf, id);
    bytes.extend_from_slice(&buf);
    bytes.extend_from_slice(payload);
    bytes
}

/// Analyses the bytes which are contained in the key or value of a kafka record. When valid it
/// will return the id and the data bytes.
pub fn decode_wire_format(bytes: &[u8]) -> Result<(u32, &[u8]), SRCError> {
    if bytes.len() < WIRE_PREFIX_SIZE {
        return Err(SRCError::non_retryable_without_cause(
            ErrorKind::MessageTooShort,
            "Invalid message: message too short to contain schema id.",
        ));
    }
    if bytes[0] != MAGIC_BYTE {
        return Err(SRCError::non_retryable_without_cause(
            ErrorKind::InvalidStartByte,
            "Invalid message: invalid start byte.",
        ));
    }
    let id = BigEndian::read_u32(&bytes[1..WIRE_PREFIX_SIZE]);
    Ok((id, &bytes[WIRE_PREFIX_SIZE..]))
}
