//! Turns a [`TlsConfig`] into something the http client can use.
use std::fs;

use reqwest::blocking::ClientBuilder;
#[cfg(any(feature = "native_tls", feature = "rustls_tls"))]
use reqwest::tls::{Certificate, Identity, Version};

use crate::config::{TlsConfig, TlsVersion};
use crate::error::{ErrorKind, SRCError};

/// TLS material that has been read from disk and parsed.
#[derive(Clone)]
pub(crate) struct TlsSettings {
    accept_invalid_certs: bool,
    min_version: Option<TlsVersion>,
    #[cfg(any(feature = "native_tls", feature = "rustls_tls"))]
    root_certificate: Option<Certificate>,
    #[cfg(any(feature = "native_tls", feature = "rustls_tls"))]
    identity: Option<Identity>,
}

impl std::fmt::Debug for TlsSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsSettings")
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("min_version", &self.min_version)
            .finish()
    }
}

/// Loads the certificates from the configured files. When TLS is not enabled this gives back an
/// error of kind [`ErrorKind::NoTlsConfig`], which callers should treat as "use plain http".
pub(crate) fn load_tls(config: &TlsConfig) -> Result<TlsSettings, SRCError> {
    if !config.enable_tls {
        return Err(SRCError::non_retryable_without_cause(
            ErrorKind::NoTlsConfig,
            "No TLS config provided. Continuing with TLS disabled.",
        ));
    }
    load_enabled(config)
}

#[cfg(any(feature = "native_tls", feature = "rustls_tls"))]
fn load_enabled(config: &TlsConfig) -> Result<TlsSettings, SRCError> {
    let root_certificate = if config.server_ca_pem.is_empty() {
        None
    } else {
        let pem = read_pem(&config.server_ca_pem)?;
        Some(Certificate::from_pem(&pem).map_err(|e| {
            SRCError::non_retryable_with_cause(
                ErrorKind::InvalidTlsConfig,
                e,
                "could not parse server CA certificate",
            )
        })?)
    };
    let identity = match (
        config.client_cert_pem.is_empty(),
        config.client_key_pem.is_empty(),
    ) {
        (true, true) => None,
        (false, false) => {
            let cert = read_pem(&config.client_cert_pem)?;
            let key = read_pem(&config.client_key_pem)?;
            Some(identity(&cert, &key)?)
        }
        _ => {
            return Err(SRCError::non_retryable_without_cause(
                ErrorKind::InvalidTlsConfig,
                "client certificate and client key need to be set together",
            ))
        }
    };
    Ok(TlsSettings {
        accept_invalid_certs: config.insecure_skip_tls_verify,
        min_version: config.min_version,
        root_certificate,
        identity,
    })
}

#[cfg(not(any(feature = "native_tls", feature = "rustls_tls")))]
fn load_enabled(_config: &TlsConfig) -> Result<TlsSettings, SRCError> {
    Err(SRCError::non_retryable_without_cause(
        ErrorKind::InvalidTlsConfig,
        "TLS was requested but this build has no TLS backend enabled",
    ))
}

#[cfg(feature = "native_tls")]
fn identity(cert: &[u8], key: &[u8]) -> Result<Identity, SRCError> {
    Identity::from_pkcs8_pem(cert, key).map_err(|e| {
        SRCError::non_retryable_with_cause(
            ErrorKind::InvalidTlsConfig,
            e,
            "could not create client identity from certificate and key",
        )
    })
}

#[cfg(all(feature = "rustls_tls", not(feature = "native_tls")))]
fn identity(cert: &[u8], key: &[u8]) -> Result<Identity, SRCError> {
    let mut pem = cert.to_vec();
    pem.push(b'\n');
    pem.extend_from_slice(key);
    Identity::from_pem(&pem).map_err(|e| {
        SRCError::non_retryable_with_cause(
            ErrorKind::InvalidTlsConfig,
            e,
            "could not create client identity from certificate and key",
        )
    })
}

fn read_pem(path: &str) -> Result<Vec<u8>, SRCError> {
    fs::read(path).map_err(|e| {
        SRCError::non_retryable_with_cause(
            ErrorKind::InvalidTlsConfig,
            e,
            &format!("could not read pem file {}", path),
        )
    })
}

#[cfg(any(feature = "native_tls", feature = "rustls_tls"))]
pub(crate) fn apply_tls(mut builder: ClientBuilder, settings: &TlsSettings) -> ClientBuilder {
    builder = builder.danger_accept_invalid_certs(settings.accept_invalid_certs);
    if let Some(version) = settings.min_version {
        builder = builder.min_tls_version(match version {
            TlsVersion::Tls10 => Version::TLS_1_0,
            TlsVersion::Tls11 => Version::TLS_1_1,
            TlsVersion::Tls12 => Version::TLS_1_2,
            TlsVersion::Tls13 => Version::TLS_1_3,
        });
    }
    if let Some(certificate) = &settings.root_certificate {
        builder = builder.add_root_certificate(certificate.clone());
    }
    if let Some(identity) = &settings.identity {
        builder = builder.identity(identity.clone());
    }
    builder
}

#[cfg(not(any(feature = "native_tls", feature = "rustls_tls")))]
pub(crate) fn apply_tls(builder: ClientBuilder, _settings: &TlsSettings) -> ClientBuilder {
    builder
}
