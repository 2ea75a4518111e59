use mockito::Matcher;
use serde_json::json;

use schema_registry_serde::error::ErrorKind;
use schema_registry_serde::schema_registry_common::{Element, SchemaType};
use test_utils::{
    get_id_body, get_json_body, get_register_body, get_subject_version_body,
    json_incorrect_bytes, json_result_java_bytes, json_result_schema,
    json_result_schema_with_id, SR_CONTENT_TYPE,
};

use crate::blocking::converter;

#[test]
fn deserialize_java_bytes() {
    let mut server = mockito::Server::new();
    let _m = server
        .mock("GET", "/schemas/ids/10?deleted=true")
        .with_status(200)
        .with_header("content-type", SR_CONTENT_TYPE)
        .with_body(get_json_body(json_result_schema(), 10))
        .create();

    let converter = converter(SchemaType::Json, &server.url(), "", false);
    let value = converter
        .deserialize("result", json_result_java_bytes(), Element::Value, "", 0)
        .unwrap();
    assert_eq!(json!({"down": "string", "up": "STRING"}), value);
}

#[test]
fn deserialize_incorrect_bytes() {
    let mut server = mockito::Server::new();
    let _m = server
        .mock("GET", "/schemas/ids/10?deleted=true")
        .with_status(200)
        .with_header("content-type", SR_CONTENT_TYPE)
        .with_body(get_json_body(json_result_schema(), 10))
        .create();

    let converter = converter(SchemaType::Json, &server.url(), "", false);
    let err = converter
        .deserialize("result", json_incorrect_bytes(), Element::Value, "", 0)
        .unwrap_err();
    assert_eq!(ErrorKind::FailedUnmarshal, err.kind);
}

#[test]
fn serialize_like_java() {
    let mut server = mockito::Server::new();
    let register = server
        .mock("POST", "/subjects/result-value/versions")
        .match_body(Matcher::JsonString(get_register_body(
            json_result_schema_with_id(),
            "JSON",
        )))
        .with_status(200)
        .with_header("content-type", SR_CONTENT_TYPE)
        .with_body(get_id_body(10))
        .expect(1)
        .create();
    let _version = server
        .mock("POST", "/subjects/result-value?deleted=false")
        .with_status(200)
        .with_header("content-type", SR_CONTENT_TYPE)
        .with_body(get_subject_version_body(
            "result-value",
            1,
            10,
            json_result_schema_with_id(),
            "JSON",
        ))
        .create();

    let converter = converter(SchemaType::Json, &server.url(), "", false);
    let bytes = converter
        .serialize(
            "result",
            r#"{"down": "string", "up": "STRING"}"#,
            Element::Value,
            json_result_schema_with_id(),
            0,
        )
        .unwrap();
    assert_eq!(json_result_java_bytes(), &bytes[..]);
    register.assert();
}

#[test]
fn invalid_value_is_still_serialized() {
    let mut server = mockito::Server::new();
    let _latest = server
        .mock("GET", "/subjects/result-key/versions/latest")
        .with_status(200)
        .with_header("content-type", SR_CONTENT_TYPE)
        .with_body(get_subject_version_body(
            "result-key",
            3,
            10,
            json_result_schema(),
            "JSON",
        ))
        .create();

    let converter = converter(SchemaType::Json, &server.url(), "", true);
    let data = r#"{"up":1,"sideways":true}"#;
    let bytes = converter
        .serialize("result", data, Element::Key, json_result_schema(), 0)
        .unwrap();
    assert_eq!(&[0, 0, 0, 0, 10], &bytes[..5]);
    assert!(bytes.len() >= 5 + r#"{"up":1,"sideways":true}"#.len());
    let value = converter
        .deserialize("result", &bytes, Element::Key, "", 0)
        .unwrap();
    assert_eq!(json!({"up": 1, "sideways": true}), value);
}

#[test]
fn record_name_needs_name_in_schema() {
    let converter = converter(
        SchemaType::Json,
        "http://127.0.0.1:1",
        "RecordNameStrategy",
        false,
    );
    let err = converter
        .serialize("result", "{}", Element::Value, json_result_schema(), 0)
        .unwrap_err();
    assert_eq!(ErrorKind::FailedTypeCast, err.kind);
}
