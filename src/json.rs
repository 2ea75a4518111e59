//! JSON Schema codec. The payload is plain compact json, the schema is only used to validate.
//!
//! Validation uses [valico]. A value that does not satisfy the schema is still encoded, the
//! violations are only logged.
//!
//! [valico]: https://crates.io/crates/valico
use log::{debug, warn};
use serde_json::Value;
use url::Url;
use valico::json_schema::{Scope, ValidationState};

use crate::error::{ErrorKind, SRCError};

const FALLBACK_ID: &str = "json-schema://local/schema.json";

/// Holds the schema compiled into its own scope, so values are validated without compiling the
/// schema again.
#[derive(Debug)]
pub struct JsonCodec {
    scope: Scope,
    id: Url,
}

impl JsonCodec {
    pub fn new(raw: &str) -> Result<JsonCodec, SRCError> {
        JsonCodec::build(raw, "Failed to create codec for encoding JSON")
    }

    /// Same as [`JsonCodec::new`], only the error tells it was meant for decoding.
    pub fn for_decoding(raw: &str) -> Result<JsonCodec, SRCError> {
        JsonCodec::build(raw, "Failed to create codec for decoding JSON data")
    }

    fn build(raw: &str, error: &str) -> Result<JsonCodec, SRCError> {
        let schema: Value = serde_json::from_str(raw).map_err(|e| {
            SRCError::non_retryable_with_cause(ErrorKind::FailedCreateCodec, e, error)
        })?;
        let id = match fetch_id(&schema) {
            Some(url) => url,
            None => Url::parse(FALLBACK_ID).map_err(|e| {
                SRCError::non_retryable_with_cause(ErrorKind::FailedCreateCodec, e, error)
            })?,
        };
        let mut scope = Scope::new();
        scope.compile_with_id(&id, schema, false).map_err(|e| {
            SRCError::non_retryable_with_cause(
                ErrorKind::FailedCreateCodec,
                format!("{:?}", e),
                error,
            )
        })?;
        debug!("compiled json schema with id {}", id);
        Ok(JsonCodec { scope, id })
    }

    /// Encodes json text into the payload, without the wire format.
    pub fn encode(&self, data: &str) -> Result<Vec<u8>, SRCError> {
        let value: Value = serde_json::from_str(data).map_err(|e| {
            SRCError::non_retryable_with_cause(
                ErrorKind::FailedUnmarshal,
                e,
                "Failed to unmarshal JSON data",
            )
        })?;
        self.log_violations(&value)?;
        serde_json::to_vec(&value).map_err(|e| {
            SRCError::non_retryable_with_cause(
                ErrorKind::FailedEncode,
                e,
                "error serialising value to bytes",
            )
        })
    }

    /// Decodes the payload, without the wire format, into a json value.
    pub fn decode(&self, bytes: &[u8]) -> Result<Value, SRCError> {
        let value: Value = serde_json::from_slice(bytes).map_err(|e| {
            SRCError::non_retryable_with_cause(
                ErrorKind::FailedUnmarshal,
                e,
                "Failed to unmarshal JSON data",
            )
        })?;
        self.log_violations(&value)?;
        Ok(value)
    }

    fn log_violations(&self, value: &Value) -> Result<(), SRCError> {
        let state = self.validation_state(value)?;
        if state.is_strictly_valid() {
            return Ok(());
        }
        if state.errors.is_empty() {
            warn!(
                "Value {} could not be fully validated because of missing references {:?}",
                value, state.missing
            );
        } else {
            warn!(
                "Value {} was not valid according to the schema because {:?}",
                value, state.errors
            );
        }
        Ok(())
    }

    fn validation_state(&self, value: &Value) -> Result<ValidationState, SRCError> {
        let schema = self.scope.resolve(&self.id).ok_or_else(|| {
            SRCError::non_retryable_without_cause(
                ErrorKind::FailedCreateCodec,
                &format!("Compiled json schema {} not found in scope", self.id),
            )
        })?;
        let state = schema.validate(value);
        debug!(
            "validated json value, strictly valid: {}",
            state.is_strictly_valid()
        );
        Ok(state)
    }
}

// The `$id` of the schema, when it is an absolute url.
fn fetch_id(schema: &Value) -> Option<Url> {
    let id = schema.as_object()?.get("$id")?.as_str()?;
    Url::parse(id).ok()
}
