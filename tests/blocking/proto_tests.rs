use mockito::Matcher;
use serde_json::json;

use schema_registry_serde::error::ErrorKind;
use schema_registry_serde::schema_registry_common::{Element, SchemaType};
use test_utils::{
    get_id_body, get_proto_body, get_proto_complex, get_proto_complex_nested, get_proto_hb_101,
    get_proto_hb_101_only_data, get_proto_hb_schema, get_proto_result, get_register_body,
    get_subject_version_body, SR_CONTENT_TYPE,
};

use crate::blocking::converter;

#[test]
fn deserialize_heartbeat() {
    let mut server = mockito::Server::new();
    let _m = server
        .mock("GET", "/schemas/ids/7?deleted=true")
        .with_status(200)
        .with_header("content-type", SR_CONTENT_TYPE)
        .with_body(get_proto_body(get_proto_hb_schema(), 7))
        .create();

    let converter = converter(SchemaType::Protobuf, &server.url(), "", false);
    let value = converter
        .deserialize("nl.openweb.data.Heartbeat", get_proto_hb_101(), Element::Value, "", 0)
        .unwrap();
    assert_eq!(json!({"beat": 101}), value);
}

#[test]
fn deserialize_nested_message() {
    let mut server = mockito::Server::new();
    let _m = server
        .mock("GET", "/schemas/ids/6?deleted=true")
        .with_status(200)
        .with_header("content-type", SR_CONTENT_TYPE)
        .with_body(get_proto_body(get_proto_complex(), 6))
        .create();

    let converter = converter(SchemaType::Protobuf, &server.url(), "", false);
    let value = converter
        .deserialize("complex", get_proto_complex_nested(), Element::Value, "", 0)
        .unwrap();
    assert_eq!(json!({"counter": 5}), value);
}

#[test]
fn serialize_registers_proto_schema() {
    let mut server = mockito::Server::new();
    let register = server
        .mock("POST", "/subjects/heartbeat-value/versions")
        .match_body(Matcher::JsonString(get_register_body(
            get_proto_hb_schema(),
            "PROTOBUF",
        )))
        .with_status(200)
        .with_header("content-type", SR_CONTENT_TYPE)
        .with_body(get_id_body(7))
        .expect(1)
        .create();
    let _version = server
        .mock("POST", "/subjects/heartbeat-value?deleted=false")
        .with_status(200)
        .with_header("content-type", SR_CONTENT_TYPE)
        .with_body(get_subject_version_body(
            "heartbeat-value",
            1,
            7,
            get_proto_hb_schema(),
            "PROTOBUF",
        ))
        .create();

    let converter = converter(SchemaType::Protobuf, &server.url(), "", false);
    let bytes = converter
        .serialize(
            "heartbeat",
            r#"{"beat": 101}"#,
            Element::Value,
            get_proto_hb_schema(),
            0,
        )
        .unwrap();
    assert_eq!(get_proto_hb_101(), &bytes[..]);
    assert_eq!(get_proto_hb_101_only_data(), &bytes[6..]);
    register.assert();
}

#[test]
fn round_trip_with_supplied_schema() {
    let mut server = mockito::Server::new();
    let _latest = server
        .mock("GET", "/subjects/result-value/versions/latest")
        .with_status(200)
        .with_header("content-type", SR_CONTENT_TYPE)
        .with_body(get_subject_version_body(
            "result-value",
            1,
            3,
            get_proto_result(),
            "PROTOBUF",
        ))
        .create();

    let converter = converter(SchemaType::Protobuf, &server.url(), "", true);
    let bytes = converter
        .serialize(
            "result",
            r#"{"up": "STRING", "down": "string"}"#,
            Element::Value,
            get_proto_result(),
            0,
        )
        .unwrap();
    assert_eq!(&[0, 0, 0, 0, 3, 0], &bytes[..6]);
    let value = converter
        .deserialize("result", &bytes, Element::Value, get_proto_result(), 0)
        .unwrap();
    assert_eq!(json!({"up": "STRING", "down": "string"}), value);
}

#[test]
fn record_name_strategy_needs_json_schema() {
    let converter = converter(
        SchemaType::Protobuf,
        "http://127.0.0.1:1",
        "TopicRecordNameStrategy",
        false,
    );
    let err = converter
        .serialize(
            "heartbeat",
            r#"{"beat": 101}"#,
            Element::Value,
            get_proto_hb_schema(),
            0,
        )
        .unwrap_err();
    assert_eq!(ErrorKind::FailedToUnmarshalSchema, err.kind);
}
