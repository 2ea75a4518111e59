use mockito::Matcher;
use serde_json::json;

use schema_registry_serde::blocking::converter::SchemaRegistryConverter;
use schema_registry_serde::config::{SchemaRegistryConfiguration, SerdeConfig};
use schema_registry_serde::error::ErrorKind;
use schema_registry_serde::schema_registry_common::{Element, SchemaType};
use test_utils::{
    get_avro_account_schema, get_avro_body, get_avro_hb_3, get_avro_hb_schema, get_id_body,
    get_register_body, get_subject_version_body, Atype, ConfirmAccountCreation, Heartbeat,
    SR_CONTENT_TYPE,
};

use crate::blocking::converter;

#[test]
fn serialize_registers_schema_once() {
    let mut server = mockito::Server::new();
    let register = server
        .mock("POST", "/subjects/heartbeat-value/versions")
        .match_body(Matcher::JsonString(get_register_body(
            get_avro_hb_schema(),
            "AVRO",
        )))
        .with_status(200)
        .with_header("content-type", SR_CONTENT_TYPE)
        .with_body(get_id_body(7))
        .expect(1)
        .create();
    let version = server
        .mock("POST", "/subjects/heartbeat-value?deleted=false")
        .with_status(200)
        .with_header("content-type", SR_CONTENT_TYPE)
        .with_body(get_subject_version_body(
            "heartbeat-value",
            1,
            7,
            get_avro_hb_schema(),
            "AVRO",
        ))
        .expect(1)
        .create();

    let converter = converter(SchemaType::Avro, &server.url(), "", false);
    let data = serde_json::to_string(&Heartbeat { beat: 3 }).unwrap();
    for _ in 0..2 {
        let bytes = converter
            .serialize("heartbeat", &data, Element::Value, get_avro_hb_schema(), 0)
            .unwrap();
        assert_eq!(get_avro_hb_3(), &bytes[..]);
    }

    register.assert();
    version.assert();
}

#[test]
fn deserialize_fetches_schema_by_id_once() {
    let mut server = mockito::Server::new();
    let by_id = server
        .mock("GET", "/schemas/ids/7?deleted=true")
        .with_status(200)
        .with_header("content-type", SR_CONTENT_TYPE)
        .with_body(get_avro_body(get_avro_hb_schema(), 7))
        .expect(1)
        .create();

    let converter = converter(SchemaType::Avro, &server.url(), "", false);
    for _ in 0..2 {
        let value = converter
            .deserialize("heartbeat", get_avro_hb_3(), Element::Value, "", 0)
            .unwrap();
        let heartbeat: Heartbeat = serde_json::from_value(value).unwrap();
        assert_eq!(Heartbeat { beat: 3 }, heartbeat);
    }

    by_id.assert();
}

#[test]
fn round_trip_with_latest_schema_and_record_name() {
    let mut server = mockito::Server::new();
    let latest = server
        .mock(
            "GET",
            "/subjects/nl.openweb.data.ConfirmAccountCreation/versions/latest",
        )
        .with_status(200)
        .with_header("content-type", SR_CONTENT_TYPE)
        .with_body(get_subject_version_body(
            "nl.openweb.data.ConfirmAccountCreation",
            2,
            12,
            get_avro_account_schema(),
            "AVRO",
        ))
        .expect(1)
        .create();

    let converter = converter(
        SchemaType::Avro,
        &server.url(),
        "RecordNameStrategy",
        true,
    );
    let account = ConfirmAccountCreation {
        name: String::from("Gerard"),
        a_type: Atype::Manual,
        nickname: None,
    };
    let data = serde_json::to_string(&account).unwrap();
    let bytes = converter
        .serialize("accounts", &data, Element::Value, get_avro_account_schema(), 0)
        .unwrap();
    assert_eq!(&[0, 0, 0, 0, 12], &bytes[..5]);

    let value = converter
        .deserialize("accounts", &bytes, Element::Value, get_avro_account_schema(), 0)
        .unwrap();
    assert_eq!(
        json!({"name": "Gerard", "a_type": "MANUAL", "nickname": null}),
        value
    );
    let back: ConfirmAccountCreation = serde_json::from_value(value).unwrap();
    assert_eq!(account, back);

    latest.assert();
}

#[test]
fn registry_not_available() {
    let converter = converter(SchemaType::Avro, "http://127.0.0.1:1", "", false);
    let err = converter
        .deserialize("heartbeat", get_avro_hb_3(), Element::Value, "", 0)
        .unwrap_err();
    assert_eq!(ErrorKind::SchemaNotFound, err.kind);
    assert!(err.retriable);

    let err = converter
        .serialize(
            "heartbeat",
            r#"{"beat":3}"#,
            Element::Value,
            get_avro_hb_schema(),
            0,
        )
        .unwrap_err();
    assert_eq!(ErrorKind::SchemaCreationFailed, err.kind);
}

#[test]
fn registry_schema_used_when_none_supplied() {
    let mut server = mockito::Server::new();
    let _by_version = server
        .mock("GET", "/subjects/heartbeat-key/versions/1")
        .with_status(200)
        .with_header("content-type", SR_CONTENT_TYPE)
        .with_body(get_subject_version_body(
            "heartbeat-key",
            1,
            7,
            get_avro_hb_schema(),
            "AVRO",
        ))
        .create();

    let converter = converter(SchemaType::Avro, &server.url(), "TopicNameStrategy", false);
    let bytes = converter
        .serialize("heartbeat", r#"{"beat":3}"#, Element::Key, "", 1)
        .unwrap();
    assert_eq!(get_avro_hb_3(), &bytes[..]);
}

#[test]
fn converter_from_configuration_uses_global_cache() {
    let mut server = mockito::Server::new();
    let by_id = server
        .mock("GET", "/schemas/ids/4711?deleted=true")
        .with_status(200)
        .with_header("content-type", SR_CONTENT_TYPE)
        .with_body(get_avro_body(get_avro_hb_schema(), 4711))
        .expect(1)
        .create();

    let config = SerdeConfig::new(
        SchemaType::Avro,
        SchemaRegistryConfiguration::with_url(&server.url()),
    );
    let bytes = [0, 0, 0, 0x12, 0x67, 6];
    for _ in 0..2 {
        // a new converter every time, the schema stays cached
        let converter = SchemaRegistryConverter::new(config.clone()).unwrap();
        let value = converter
            .deserialize("heartbeat", &bytes, Element::Value, "", 0)
            .unwrap();
        assert_eq!(json!({"beat": 3}), value);
    }
    by_id.assert();
}
