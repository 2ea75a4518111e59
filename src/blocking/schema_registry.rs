//! This module contains the code specific for the schema registry.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use log::{debug, error, info};
use reqwest::blocking::{Client, ClientBuilder, RequestBuilder, Response};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::{Map, Value};
use url::Url;

use crate::config::SchemaRegistryConfiguration;
use crate::error::{ErrorKind, SRCError};
use crate::schema_registry_common::{
    url_for_call, RawRegisteredSchema, RegisteredSchema, SchemaType, SrAuthorization, SrCall,
    DEFAULT_CONCURRENT_REQUESTS,
};
use crate::tls::{apply_tls, load_tls, TlsSettings};

const SR_CONTENT_TYPE: &str = "application/vnd.schemaregistry.v1+json";

/// The calls the converter needs from a schema registry. All of them block until the registry
/// answered. Implemented by [`SrClient`], other implementations are mostly useful for tests.
pub trait SchemaRegistry: Send + Sync {
    /// Fails with [`ErrorKind::SchemaNotFound`] when the subject has no versions, or the registry
    /// can't be reached.
    fn get_latest_schema(&self, subject: &str) -> Result<RegisteredSchema, SRCError>;
    fn get_schema_by_version(
        &self,
        subject: &str,
        version: u32,
    ) -> Result<RegisteredSchema, SRCError>;
    fn get_schema_by_id(&self, id: u32) -> Result<RegisteredSchema, SRCError>;
    /// Registers the schema, when it's already present the registry gives back the existing id.
    /// Fails with [`ErrorKind::SchemaCreationFailed`].
    fn create_schema(
        &self,
        subject: &str,
        schema: &str,
        schema_type: SchemaType,
    ) -> Result<RegisteredSchema, SRCError>;
}

/// Client to do the calls to schema registry. For simple cases you can use `SrClient::new` or
/// the `SrClientBuilder`, when starting from configuration use `SrClient::from_configuration`.
/// ```
/// use schema_registry_serde::blocking::schema_registry::SrClient;
/// let sr_client = SrClient::new(String::from("http://localhost:8081"));
/// ```
#[derive(Debug, Clone)]
pub struct SrClient {
    url: String,
    client: Client,
    authorization: SrAuthorization,
    permits: Arc<RequestPermits>,
}

/// Struct to create an SrClient with authorization, TLS, a custom timeout or a different limit
/// on concurrent calls.
pub struct SrClientBuilder {
    url: String,
    authorization: SrAuthorization,
    tls: Option<TlsSettings>,
    timeout: Duration,
    concurrent_requests: usize,
}

impl SrClient {
    /// Will create a new SrClient with default values, the url should be fully qualified like
    /// `"http://localhost:8081"`.
    pub fn new(url: String) -> SrClient {
        SrClient {
            url,
            client: Client::new(),
            authorization: SrAuthorization::None,
            permits: Arc::new(RequestPermits::new(DEFAULT_CONCURRENT_REQUESTS)),
        }
    }

    /// Will create a new SrClientBuilder with default values, the url should be fully qualified
    /// like `"http://localhost:8081"`.
    pub fn new_builder(url: String) -> SrClientBuilder {
        SrClientBuilder {
            url,
            authorization: SrAuthorization::None,
            tls: None,
            timeout: Duration::from_secs(30),
            concurrent_requests: DEFAULT_CONCURRENT_REQUESTS,
        }
    }

    /// Creates the client the way the configuration describes. Not asking for TLS is fine and
    /// gives a plain client, asking for it with unusable settings is an error.
    pub fn from_configuration(
        configuration: &SchemaRegistryConfiguration,
    ) -> Result<SrClient, SRCError> {
        let mut builder = SrClient::new_builder(configuration.url.clone());
        builder
            .set_timeout(Duration::from_secs(configuration.timeout_secs))
            .set_concurrent_requests(configuration.concurrent_requests);
        match load_tls(&configuration.tls) {
            Ok(tls) => {
                builder.tls = Some(tls);
            }
            Err(e) if e.kind == ErrorKind::NoTlsConfig => debug!("{}", e.error),
            Err(e) => {
                error!("Cannot process TLS config: {}", e);
                return Err(e);
            }
        }
        let basic_auth = &configuration.basic_auth;
        if !basic_auth.username.is_empty() && !basic_auth.password.is_empty() {
            builder.set_basic_authorization(&basic_auth.username, Some(&basic_auth.password));
        }
        let client = builder.build()?;
        info!(
            "created schema registry client for {} (tls: {})",
            client.url,
            configuration.tls.enable_tls
        );
        Ok(client)
    }

    /// Sets basic authentication, for confluent cloud, the username is the API Key and the
    /// password is the API Secret.
    pub fn set_credentials(&mut self, username: &str, password: &str) {
        self.authorization =
            SrAuthorization::Basic(String::from(username), Some(String::from(password)));
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Builder for SrClient
/// ```
/// use schema_registry_serde::blocking::schema_registry::SrClient;
/// use std::time::Duration;
/// let sr_client = SrClient::new_builder(String::from("http://localhost:8081"))
///     .set_basic_authorization("user", Some("secret"))
///     .set_timeout(Duration::from_secs(5))
///     .set_concurrent_requests(4)
///     .build().unwrap();
/// ```
impl SrClientBuilder {
    /// Sets basic authentication, for confluent cloud, the username is the API Key and the
    /// password is the API Secret.
    pub fn set_basic_authorization(
        &mut self,
        username: &str,
        password: Option<&str>,
    ) -> &mut SrClientBuilder {
        self.authorization =
            SrAuthorization::Basic(String::from(username), password.map(String::from));
        self
    }

    /// Set a timeout, it will be used for the connect and the read.
    pub fn set_timeout(&mut self, duration: Duration) -> &mut SrClientBuilder {
        self.timeout = duration;
        self
    }

    /// Caps the amount of calls in flight at the same time, values below one are raised to one.
    pub fn set_concurrent_requests(&mut self, concurrent_requests: usize) -> &mut SrClientBuilder {
        self.concurrent_requests = concurrent_requests.max(1);
        self
    }

    /// Build the client, fails when the url can't be parsed.
    pub fn build(&mut self) -> Result<SrClient, SRCError> {
        if let Err(e) = Url::parse(&self.url) {
            return Err(SRCError::non_retryable_with_cause(
                ErrorKind::InvalidConfiguration,
                e,
                &format!("invalid schema registry url {}", self.url),
            ));
        }
        let client = self.build_client(Client::builder())?;
        Ok(SrClient {
            url: self.url.clone(),
            client,
            authorization: self.authorization.clone(),
            permits: Arc::new(RequestPermits::new(self.concurrent_requests)),
        })
    }

    fn build_client(&mut self, mut builder: ClientBuilder) -> Result<Client, SRCError> {
        if let Some(tls) = &self.tls {
            builder = apply_tls(builder, tls);
        }
        builder = builder
            .timeout(self.timeout)
            .pool_max_idle_per_host(self.concurrent_requests);
        match builder.build() {
            Ok(client) => Ok(client),
            Err(e) => Err(SRCError::non_retryable_with_cause(
                ErrorKind::FailedCreateClient,
                e,
                "could not create new client",
            )),
        }
    }
}

impl SchemaRegistry for SrClient {
    fn get_latest_schema(&self, subject: &str) -> Result<RegisteredSchema, SRCError> {
        get_latest_schema(subject, self)
    }

    fn get_schema_by_version(
        &self,
        subject: &str,
        version: u32,
    ) -> Result<RegisteredSchema, SRCError> {
        get_schema_by_version(subject, version, self)
    }

    fn get_schema_by_id(&self, id: u32) -> Result<RegisteredSchema, SRCError> {
        get_schema_by_id(id, self)
    }

    fn create_schema(
        &self,
        subject: &str,
        schema: &str,
        schema_type: SchemaType,
    ) -> Result<RegisteredSchema, SRCError> {
        post_schema(self, subject, schema, schema_type)
    }
}

/// Gets a schema by an id. This is used to get the correct schema te deserialize bytes, with the
/// id that is encoded in the bytes.
pub fn get_schema_by_id(id: u32, sr_client: &SrClient) -> Result<RegisteredSchema, SRCError> {
    let call = SrCall::GetById(id);
    perform_sr_call(sr_client, call)?.into_registered(Some(id), call.error_kind())
}

pub fn get_latest_schema(
    subject: &str,
    sr_client: &SrClient,
) -> Result<RegisteredSchema, SRCError> {
    let call = SrCall::GetLatest(subject);
    let mut schema = perform_sr_call(sr_client, call)?.into_registered(None, call.error_kind())?;
    schema.subject.get_or_insert_with(|| String::from(subject));
    Ok(schema)
}

pub fn get_schema_by_version(
    subject: &str,
    version: u32,
    sr_client: &SrClient,
) -> Result<RegisteredSchema, SRCError> {
    let call = SrCall::GetBySubjectAndVersion(subject, version);
    let mut schema = perform_sr_call(sr_client, call)?.into_registered(None, call.error_kind())?;
    schema.subject.get_or_insert_with(|| String::from(subject));
    schema.version.get_or_insert(version);
    Ok(schema)
}

/// Handles posting the schema, and getting back the id. When the schema is already in the schema
/// registry, the matching id is returned. When it's not it depends on the settings of the schema
/// registry. The default config will check if the schema is backwards compatible. The version is
/// looked up with a second call, since the first one only returns the id.
pub fn post_schema(
    sr_client: &SrClient,
    subject: &str,
    schema: &str,
    schema_type: SchemaType,
) -> Result<RegisteredSchema, SRCError> {
    let body = get_body(schema_type, schema);
    let id = call_and_get_id(sr_client, SrCall::PostNew(subject, &body))?;
    let version = call_and_get_version(sr_client, SrCall::PostForVersion(subject, &body))?;
    debug!(
        "registered schema for subject {} with id {} as version {}",
        subject, id, version
    );
    Ok(RegisteredSchema {
        id,
        subject: Some(String::from(subject)),
        version: Some(version),
        schema_type,
        schema: String::from(schema),
    })
}

fn get_body(schema_type: SchemaType, schema: &str) -> String {
    let mut root_element = Map::new();
    root_element.insert(String::from("schema"), Value::String(String::from(schema)));
    root_element.insert(
        String::from("schemaType"),
        Value::String(String::from(schema_type.as_str())),
    );
    Value::Object(root_element).to_string()
}

fn call_and_get_id(sr_client: &SrClient, sr_call: SrCall) -> Result<u32, SRCError> {
    let raw_schema = perform_sr_call(sr_client, sr_call)?;
    match raw_schema.id {
        Some(v) => Ok(v),
        None => Err(SRCError::non_retryable_without_cause(
            sr_call.error_kind(),
            &format!("Could not get id from response for {:?}", sr_call),
        )),
    }
}

fn call_and_get_version(sr_client: &SrClient, sr_call: SrCall) -> Result<u32, SRCError> {
    let raw_schema = perform_sr_call(sr_client, sr_call)?;
    match raw_schema.version {
        Some(v) => Ok(v),
        None => Err(SRCError::non_retryable_without_cause(
            sr_call.error_kind(),
            &format!("Could not get version from response for {:?}", sr_call),
        )),
    }
}

pub fn perform_sr_call(
    sr_client: &SrClient,
    sr_call: SrCall,
) -> Result<RawRegisteredSchema, SRCError> {
    let _permit = sr_client.permits.acquire();
    let url = url_for_call(&sr_call, &sr_client.url);
    debug!("calling schema registry: {}", url);
    let builder = match sr_call {
        SrCall::GetById(_) | SrCall::GetLatest(_) | SrCall::GetBySubjectAndVersion(_, _) => {
            sr_client.client.get(&url).header(ACCEPT, SR_CONTENT_TYPE)
        }
        SrCall::PostNew(_, body) | SrCall::PostForVersion(_, body) => sr_client
            .client
            .post(&url)
            .body(String::from(body))
            .header(CONTENT_TYPE, SR_CONTENT_TYPE)
            .header(ACCEPT, SR_CONTENT_TYPE),
    };
    let kind = sr_call.error_kind();
    let response = match apply_authentication(builder, &sr_client.authorization) {
        Ok(v) => v,
        Err(e) => {
            return Err(SRCError::retryable_with_cause(
                kind,
                e,
                "http call to schema registry failed",
            ))
        }
    };
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(SRCError::new(
            kind,
            &format!("schema registry responded with status {}", status),
            Some(body),
            status.is_server_error(),
        ));
    }
    match response.json::<RawRegisteredSchema>() {
        Ok(r) => Ok(r),
        Err(e) => Err(SRCError::non_retryable_with_cause(
            kind,
            e,
            "could not parse to RawRegisteredSchema, cause will give more information",
        )),
    }
}

fn apply_authentication(
    builder: RequestBuilder,
    authentication: &SrAuthorization,
) -> Result<Response, reqwest::Error> {
    match authentication {
        SrAuthorization::None => builder.send(),
        SrAuthorization::Basic(username, password) => {
            builder.basic_auth(username, password.as_ref()).send()
        }
    }
}

/// Counting semaphore limiting the number of calls in flight, shared by clones of a client.
#[derive(Debug)]
struct RequestPermits {
    available: Mutex<usize>,
    released: Condvar,
}

struct Permit<'a> {
    permits: &'a RequestPermits,
}

impl RequestPermits {
    fn new(count: usize) -> RequestPermits {
        RequestPermits {
            available: Mutex::new(count),
            released: Condvar::new(),
        }
    }

    fn acquire(&self) -> Permit<'_> {
        let mut available = self.available.lock().unwrap_or_else(PoisonError::into_inner);
        while *available == 0 {
            available = self
                .released
                .wait(available)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *available -= 1;
        Permit { permits: self }
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        let mut available = self
            .permits
            .available
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *available += 1;
        self.permits.released.notify_one();
    }
}
