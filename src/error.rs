//! implementation for [`SRCError`]
use std::error::Error;
use std::fmt;
use std::fmt::Display;

/// Every way a conversion can fail. The kind is what callers should match on, the message and
/// cause are there for humans.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The bytes are shorter than the 5 byte envelope.
    MessageTooShort,
    /// The first byte of the envelope is not the magic zero byte.
    InvalidStartByte,
    /// Envelope errors as seen from a format codec.
    FailedDecodeFromWireFormat,
    SchemaNotFound,
    SchemaCreationFailed,
    FailedToUnmarshalSchema,
    FailedTypeCast,
    UnknownSubjectNameStrategy,
    FailedCreateCodec,
    FailedUnmarshal,
    FailedEncode,
    FailedDecode,
    /// Not a failure, TLS was simply not asked for.
    NoTlsConfig,
    InvalidTlsConfig,
    FailedCreateClient,
    InvalidConfiguration,
}

/// Error struct which carries the kind of failure, a message, the optional underlying cause and
/// whether trying it again might not cause an error.
#[derive(Clone, Debug, PartialEq)]
pub struct SRCError {
    pub kind: ErrorKind,
    pub error: String,
    pub cause: Option<String>,
    pub retriable: bool,
}

/// Implements standard error so error handling can be simplified
impl Error for SRCError {}

/// Gives the information from the error in a readable format.
impl fmt::Display for SRCError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(
                f,
                "Error: {} ({:?}), was cause by {}, it's retriable: {}",
                self.error, self.kind, &cause, self.retriable
            ),
            None => write!(
                f,
                "Error: {} ({:?}) had no other cause, it's retriable: {}",
                self.error, self.kind, self.retriable
            ),
        }
    }
}

impl SRCError {
    pub fn new(kind: ErrorKind, error: &str, cause: Option<String>, retriable: bool) -> SRCError {
        SRCError {
            kind,
            error: error.to_owned(),
            cause,
            retriable,
        }
    }
    pub fn retryable_with_cause<T: Display>(kind: ErrorKind, cause: T, error: &str) -> SRCError {
        SRCError::new(kind, error, Some(format!("{}", cause)), true)
    }
    pub fn non_retryable_with_cause<T: Display>(
        kind: ErrorKind,
        cause: T,
        error: &str,
    ) -> SRCError {
        SRCError::new(kind, error, Some(format!("{}", cause)), false)
    }
    pub fn non_retryable_without_cause(kind: ErrorKind, error: &str) -> SRCError {
        SRCError::new(kind, error, None, false)
    }
    /// Puts this error behind a new one of the given kind, keeping the retriable flag.
    pub fn wrap(self, kind: ErrorKind, error: &str) -> SRCError {
        let retriable = self.retriable;
        SRCError::new(kind, error, Some(format!("{}", self)), retriable)
    }
    /// Keeps everything but replaces the kind, used where the same failure means something
    /// different depending on which call made it.
    pub(crate) fn with_kind(mut self, kind: ErrorKind) -> SRCError {
        self.kind = kind;
        self
    }
}
