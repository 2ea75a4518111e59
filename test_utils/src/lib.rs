use serde::{Deserialize, Serialize};
use serde_json::json;

pub const SR_CONTENT_TYPE: &str = "application/vnd.schemaregistry.v1+json";

pub fn get_avro_hb_schema() -> &'static str {
    r#"{"type":"record","name":"Heartbeat","namespace":"nl.openweb.data","fields":[{"name":"beat","type":"long"}]}"#
}

pub fn get_avro_account_schema() -> &'static str {
    r#"{"type":"record","name":"ConfirmAccountCreation","namespace":"nl.openweb.data","fields":[{"name":"name","type":"string"},{"name":"a_type","type":{"type":"enum","name":"Atype","symbols":["AUTO","MANUAL"]}},{"name":"nickname","type":["null","string"],"default":null}]}"#
}

pub fn get_avro_hb_3() -> &'static [u8] {
    &[0, 0, 0, 0, 7, 6]
}

pub fn get_proto_hb_schema() -> &'static str {
    "syntax = \"proto3\";\npackage nl.openweb.data;\n\nmessage Heartbeat {\n  uint64 beat = 1;\n}\n"
}

pub fn get_proto_result() -> &'static str {
    "syntax = \"proto3\";\npackage org.schema_registry_test_app.proto;\n\nmessage Result {\n  string up = 1;\n  string down = 2;\n}\n"
}

/// Several top level messages, one of them nested, to test the message indexes.
pub fn get_proto_complex() -> &'static str {
    r#"syntax = "proto3";
package org.schema_registry_test_app.proto;

message A {
  bytes id = 1;
}

message B {
  bytes id = 1;
}

message C {
  bytes id = 1;
  D d = 2;
  message D {
    int64 counter = 1;
  }
}
"#
}

pub fn get_proto_hb_101() -> &'static [u8] {
    &[0, 0, 0, 0, 7, 0, 8, 101]
}

pub fn get_proto_hb_101_only_data() -> &'static [u8] {
    &get_proto_hb_101()[6..]
}

/// Message of type `C.D` from [`get_proto_complex`] with counter 5.
pub fn get_proto_complex_nested() -> &'static [u8] {
    &[0, 0, 0, 0, 6, 4, 4, 0, 8, 5]
}

pub fn json_result_schema() -> &'static str {
    r#"{"$schema":"http://json-schema.org/draft-07/schema#","title":"Json Test","type":"object","additionalProperties":false,"javaType":"org.schema_registry_test_app.json.Result","properties":{"up":{"type":"string"},"down":{"type":"string"}},"required":["up","down"]}"#
}

pub fn json_result_schema_with_id() -> &'static str {
    r#"{"$id":"http://www.example.com/result.json","$schema":"http://json-schema.org/draft-07/schema#","title":"Json Test","type":"object","additionalProperties":false,"javaType":"org.schema_registry_test_app.json.Result","properties":{"up":{"type":"string"},"down":{"type":"string"}},"required":["up","down"]}"#
}

/// `{"down":"string","up":"STRING"}` as written by the Java serializer with schema id 10.
pub fn json_result_java_bytes() -> &'static [u8] {
    &[
        0, 0, 0, 0, 10, 123, 34, 100, 111, 119, 110, 34, 58, 34, 115, 116, 114, 105, 110, 103, 34,
        44, 34, 117, 112, 34, 58, 34, 83, 84, 82, 73, 78, 71, 34, 125,
    ]
}

pub fn json_incorrect_bytes() -> &'static [u8] {
    &[
        0, 0, 0, 0, 10, 0, 34, 100, 111, 119, 110, 34, 58, 34, 115, 116, 114, 105, 110, 103, 34,
        44, 34, 117, 112, 34, 58, 34, 83, 84, 82, 73, 78, 71, 34, 125,
    ]
}

/// Response of the registry when getting a schema, without schema type like older registries.
pub fn get_avro_body(schema: &str, id: u32) -> String {
    json!({"schema": schema, "id": id}).to_string()
}

pub fn get_json_body(schema: &str, id: u32) -> String {
    json!({"schema": schema, "schemaType": "JSON", "id": id}).to_string()
}

pub fn get_proto_body(schema: &str, id: u32) -> String {
    json!({"schema": schema, "schemaType": "PROTOBUF", "id": id}).to_string()
}

pub fn get_subject_version_body(
    subject: &str,
    version: u32,
    id: u32,
    schema: &str,
    schema_type: &str,
) -> String {
    json!({
        "subject": subject,
        "version": version,
        "id": id,
        "schemaType": schema_type,
        "schema": schema
    })
    .to_string()
}

/// Body the client is expected to post when registering.
pub fn get_register_body(schema: &str, schema_type: &str) -> String {
    json!({"schema": schema, "schemaType": schema_type}).to_string()
}

pub fn get_id_body(id: u32) -> String {
    json!({ "id": id }).to_string()
}

#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct Heartbeat {
    pub beat: i64,
}

#[derive(Debug, PartialEq, Eq, Clone, Default, Deserialize, Serialize)]
pub enum Atype {
    #[serde(rename = "AUTO")]
    #[default]
    Auto,
    #[serde(rename = "MANUAL")]
    Manual,
}

#[derive(Debug, PartialEq, Clone, Deserialize, Serialize)]
pub struct ConfirmAccountCreation {
    pub name: String,
    pub a_type: Atype,
    pub nickname: Option<String>,
}
