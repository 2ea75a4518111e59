use schema_registry_serde::blocking::schema_registry::{SchemaRegistry, SrClient};
use schema_registry_serde::config::{BasicAuth, SchemaRegistryConfiguration};
use schema_registry_serde::error::ErrorKind;
use schema_registry_serde::schema_registry_common::SchemaType;
use test_utils::{get_avro_hb_schema, get_json_body, get_subject_version_body, SR_CONTENT_TYPE};

#[test]
fn subject_with_slash_is_escaped() {
    let mut server = mockito::Server::new();
    let _m = server
        .mock("GET", "/subjects/team%2Fheartbeat-value/versions/latest")
        .with_status(200)
        .with_header("content-type", SR_CONTENT_TYPE)
        .with_body(get_subject_version_body(
            "team/heartbeat-value",
            2,
            8,
            get_avro_hb_schema(),
            "AVRO",
        ))
        .create();

    let sr_client = SrClient::new(server.url());
    let schema = sr_client.get_latest_schema("team/heartbeat-value").unwrap();
    assert_eq!(8, schema.id);
    assert_eq!(Some(2), schema.version);
    assert_eq!(get_avro_hb_schema(), schema.schema);
}

#[test]
fn get_by_version_with_configured_credentials() {
    let mut server = mockito::Server::new();
    let _m = server
        .mock("GET", "/subjects/heartbeat-value/versions/2")
        .match_header("authorization", "Basic dXNlcjpzZWNyZXQ=")
        .with_status(200)
        .with_header("content-type", SR_CONTENT_TYPE)
        .with_body(get_subject_version_body(
            "heartbeat-value",
            2,
            8,
            get_avro_hb_schema(),
            "AVRO",
        ))
        .create();

    let configuration = SchemaRegistryConfiguration {
        basic_auth: BasicAuth {
            username: String::from("user"),
            password: String::from("secret"),
        },
        ..SchemaRegistryConfiguration::with_url(&server.url())
    };
    let sr_client = SrClient::from_configuration(&configuration).unwrap();
    let schema = sr_client
        .get_schema_by_version("heartbeat-value", 2)
        .unwrap();
    assert_eq!(8, schema.id);
    assert_eq!(SchemaType::Avro, schema.schema_type);
}

#[test]
fn server_error_is_retriable() {
    let mut server = mockito::Server::new();
    let _m = server
        .mock("GET", "/schemas/ids/3?deleted=true")
        .with_status(503)
        .with_body("registry is starting")
        .create();

    let sr_client = SrClient::new(server.url());
    let err = sr_client.get_schema_by_id(3).unwrap_err();
    assert_eq!(ErrorKind::SchemaNotFound, err.kind);
    assert!(err.retriable);
}

#[test]
fn unsupported_schema_type() {
    let mut server = mockito::Server::new();
    let _m = server
        .mock("GET", "/schemas/ids/3?deleted=true")
        .with_status(200)
        .with_header("content-type", SR_CONTENT_TYPE)
        .with_body(r#"{"schema":"{}","schemaType":"XML"}"#)
        .create();

    let sr_client = SrClient::new(server.url());
    let err = sr_client.get_schema_by_id(3).unwrap_err();
    assert_eq!(ErrorKind::SchemaNotFound, err.kind);
}

#[test]
fn json_schema_by_id() {
    let mut server = mockito::Server::new();
    let _m = server
        .mock("GET", "/schemas/ids/5?deleted=true")
        .with_status(200)
        .with_header("content-type", SR_CONTENT_TYPE)
        .with_body(get_json_body("{}", 5))
        .create();

    let sr_client = SrClient::new(format!("{}/", server.url()));
    let schema = sr_client.get_schema_by_id(5).unwrap();
    assert_eq!(SchemaType::Json, schema.schema_type);
    assert_eq!("{}", schema.schema);
}
