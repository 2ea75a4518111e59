//! Determines the subject a schema is registered under in the schema registry.
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::{ErrorKind, SRCError};
use crate::schema_registry_common::Element;

/// Strategy similar to the one in the Java client. Historically the only available strategy was
/// the TopicNameStrategy. This meant in practice that a topic could only have one type, or the
/// restriction on backwards compatibility was to be abandoned. Using either of the two other
/// strategies allows multiple types of schema on one topic, while still being able to keep the
/// restriction on schema's being backwards compatible.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubjectNameStrategy {
    #[default]
    TopicNameStrategy,
    RecordNameStrategy,
    TopicRecordNameStrategy,
}

impl FromStr for SubjectNameStrategy {
    type Err = SRCError;

    /// An empty string is the same as not configuring a strategy, which means the topic name
    /// strategy.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "TopicNameStrategy" => Ok(SubjectNameStrategy::TopicNameStrategy),
            "RecordNameStrategy" => Ok(SubjectNameStrategy::RecordNameStrategy),
            "TopicRecordNameStrategy" => Ok(SubjectNameStrategy::TopicRecordNameStrategy),
            other => Err(SRCError::non_retryable_without_cause(
                ErrorKind::UnknownSubjectNameStrategy,
                &format!("Unknown subject name strategy: {}", other),
            )),
        }
    }
}

impl SubjectNameStrategy {
    /// Gets the subject, which is also used as key to cache the results. It's constructed so that
    /// it's compatible with the Java client. The schema is only read for the record name based
    /// strategies.
    pub fn subject(&self, topic: &str, element: Element, schema: &str) -> Result<String, SRCError> {
        match self {
            SubjectNameStrategy::TopicNameStrategy => Ok(format!("{}-{}", topic, element)),
            SubjectNameStrategy::RecordNameStrategy => record_name(schema),
            SubjectNameStrategy::TopicRecordNameStrategy => {
                Ok(format!("{}-{}", topic, record_name(schema)?))
            }
        }
    }
}

/// Parses the strategy and computes the subject in one go.
pub fn get_subject(
    topic: &str,
    element: Element,
    strategy: &str,
    schema: &str,
) -> Result<String, SRCError> {
    SubjectNameStrategy::from_str(strategy)?.subject(topic, element, schema)
}

/// The fully qualified name of the record, read from the `namespace` and `name` fields of the
/// schema. Only an absent namespace leaves just the name, an empty one still adds the dot.
fn record_name(schema: &str) -> Result<String, SRCError> {
    let schema_map: Map<String, Value> = match serde_json::from_str(schema) {
        Ok(v) => v,
        Err(e) => {
            return Err(SRCError::non_retryable_with_cause(
                ErrorKind::FailedToUnmarshalSchema,
                e,
                "Failed to unmarshal schema",
            ))
        }
    };
    let namespace = match schema_map.get("namespace") {
        None => None,
        Some(Value::String(ns)) => Some(ns.as_str()),
        Some(other) => return Err(cast_error("namespace", other)),
    };
    let name = match schema_map.get("name") {
        Some(Value::String(n)) => n.as_str(),
        Some(other) => return Err(cast_error("name", other)),
        None => {
            return Err(SRCError::non_retryable_without_cause(
                ErrorKind::FailedTypeCast,
                "Failed to cast to string, schema has no name",
            ))
        }
    };
    match namespace {
        Some(ns) => Ok(format!("{}.{}", ns, name)),
        None => Ok(String::from(name)),
    }
}

fn cast_error(field: &str, value: &Value) -> SRCError {
    SRCError::non_retryable_without_cause(
        ErrorKind::FailedTypeCast,
        &format!("Failed to cast to string, {} was {}", field, value),
    )
}
