//! Protobuf codec, working from the `.proto` text as stored in the schema registry.
//!
//! The text is parsed with [protox-parse] into a [prost-reflect] descriptor pool, values are
//! mapped using the protobuf json mapping. Every payload starts with the message indexes that
//! point at the message type within the schema, the same way the Java serializer does it:
//! a single `0` byte for the first top level message, otherwise a zig-zag varint count
//! followed by one zig-zag varint per nesting level.
//!
//! [protox-parse]: https://crates.io/crates/protox-parse
//! [prost-reflect]: https://crates.io/crates/prost-reflect
use integer_encoding::VarInt;
use prost::Message;
use prost_reflect::{DescriptorPool, DynamicMessage, MessageDescriptor, SerializeOptions};
use serde_json::error::Category;
use serde_json::Value;

use crate::error::{ErrorKind, SRCError};

const FILE_NAME: &str = "schema.proto";

#[derive(Debug, Clone)]
pub struct ProtoCodec {
    pool: DescriptorPool,
}

impl ProtoCodec {
    pub fn new(raw: &str) -> Result<ProtoCodec, SRCError> {
        let file = protox_parse::parse(FILE_NAME, raw).map_err(|e| {
            SRCError::non_retryable_with_cause(
                ErrorKind::FailedCreateCodec,
                e,
                "Failed to create codec for Protobuf schema",
            )
        })?;
        let mut pool = DescriptorPool::new();
        pool.add_file_descriptor_proto(file).map_err(|e| {
            SRCError::non_retryable_with_cause(
                ErrorKind::FailedCreateCodec,
                e,
                "Failed to create codec for Protobuf schema",
            )
        })?;
        let codec = ProtoCodec { pool };
        codec
            .message_for_index(&[0])
            .map_err(|e| e.with_kind(ErrorKind::FailedCreateCodec))?;
        Ok(codec)
    }

    /// Full name of the message that is used when encoding.
    pub(crate) fn full_name(&self) -> Option<String> {
        self.message_for_index(&[0])
            .ok()
            .map(|message| String::from(message.full_name()))
    }

    /// Encodes json text as the first top level message of the schema, including the message
    /// indexes, but without the wire format.
    pub fn encode(&self, data: &str) -> Result<Vec<u8>, SRCError> {
        let descriptor = self.message_for_index(&[0])?;
        let mut deserializer = serde_json::Deserializer::from_str(data);
        let message = match DynamicMessage::deserialize(descriptor, &mut deserializer) {
            Ok(m) => m,
            Err(e) => {
                let kind = match e.classify() {
                    Category::Syntax | Category::Eof => ErrorKind::FailedUnmarshal,
                    _ => ErrorKind::FailedEncode,
                };
                return Err(SRCError::non_retryable_with_cause(
                    kind,
                    e,
                    "Failed to map JSON data to the Protobuf message",
                ));
            }
        };
        deserializer.end().map_err(|e| {
            SRCError::non_retryable_with_cause(
                ErrorKind::FailedUnmarshal,
                e,
                "Failed to unmarshal JSON data",
            )
        })?;
        let mut bytes = encode_indexes(&[0]);
        bytes.extend(message.encode_to_vec());
        Ok(bytes)
    }

    /// Decodes the payload, starting with the message indexes, into a json value.
    pub fn decode(&self, bytes: &[u8]) -> Result<Value, SRCError> {
        let (indexes, data) = decode_indexes(bytes)?;
        let descriptor = self.message_for_index(&indexes)?;
        let message = DynamicMessage::decode(descriptor, data).map_err(|e| {
            SRCError::non_retryable_with_cause(
                ErrorKind::FailedDecode,
                e,
                "Could not decode Protobuf message",
            )
        })?;
        let options = SerializeOptions::new()
            .use_proto_field_name(true)
            .stringify_64_bit_integers(false)
            .skip_default_fields(false);
        message
            .serialize_with_options(serde_json::value::Serializer, &options)
            .map_err(|e| {
                SRCError::non_retryable_with_cause(
                    ErrorKind::FailedDecode,
                    e,
                    "Could not transform Protobuf message to json",
                )
            })
    }

    fn message_for_index(&self, indexes: &[i32]) -> Result<MessageDescriptor, SRCError> {
        let not_found = || {
            SRCError::non_retryable_without_cause(
                ErrorKind::FailedDecode,
                &format!("Could not retrieve message for index: {:?}", indexes),
            )
        };
        let file = self.pool.get_file_by_name(FILE_NAME).ok_or_else(not_found)?;
        let (first, rest) = indexes.split_first().ok_or_else(not_found)?;
        let mut descriptor = file
            .messages()
            .nth(to_position(*first).ok_or_else(not_found)?)
            .ok_or_else(not_found)?;
        for i in rest {
            let next = descriptor
                .child_messages()
                .nth(to_position(*i).ok_or_else(not_found)?)
                .ok_or_else(not_found)?;
            descriptor = next;
        }
        Ok(descriptor)
    }
}

fn to_position(index: i32) -> Option<usize> {
    usize::try_from(index).ok()
}

pub(crate) fn encode_indexes(indexes: &[i32]) -> Vec<u8> {
    if indexes == [0] {
        return vec![0u8];
    }
    let mut result = (indexes.len() as i32).encode_var_vec();
    for i in indexes {
        result.append(&mut i.encode_var_vec())
    }
    result
}

pub(crate) fn decode_indexes(bytes: &[u8]) -> Result<(Vec<i32>, &[u8]), SRCError> {
    let invalid = || {
        SRCError::non_retryable_without_cause(
            ErrorKind::FailedDecode,
            "Could not read message indexes from Protobuf payload",
        )
    };
    let (count, mut offset) = i32::decode_var(bytes).ok_or_else(invalid)?;
    if count == 0 {
        return Ok((vec![0], &bytes[offset..]));
    }
    // every index takes at least one byte
    if count < 0 || count as usize > bytes.len() - offset {
        return Err(invalid());
    }
    let mut indexes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (index, read) = i32::decode_var(&bytes[offset..]).ok_or_else(invalid)?;
        indexes.push(index);
        offset += read;
    }
    Ok((indexes, &bytes[offset..]))
}
