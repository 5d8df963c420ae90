//! Error taxonomy for OCPP-J endpoints
//!
//! Two families of errors live here:
//! - [`ProtocolError`]: the value carried by a CALLERROR frame on the wire
//!   (`[4, messageId, errorCode, errorDescription, errorDetails]`)
//! - [`OcppError`]: everything a caller of the local API can observe,
//!   including protocol errors received from the peer

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::transport::TransportError;
use crate::validate::Violation;

/// OCPP-J error codes (closed set shared by 1.6J and 2.0.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    NotImplemented,
    NotSupported,
    InternalError,
    ProtocolError,
    SecurityError,
    /// OCPP 1.6 name of the format error
    FormationViolation,
    /// OCPP 2.0.1 name of the format error
    FormatViolation,
    PropertyConstraintViolation,
    #[serde(alias = "OccurenceConstraintViolation")]
    OccurrenceConstraintViolation,
    TypeConstraintViolation,
    GenericError,
    MessageTypeNotSupported,
    RpcFrameworkError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotImplemented => "NotImplemented",
            ErrorCode::NotSupported => "NotSupported",
            ErrorCode::InternalError => "InternalError",
            ErrorCode::ProtocolError => "ProtocolError",
            ErrorCode::SecurityError => "SecurityError",
            ErrorCode::FormationViolation => "FormationViolation",
            ErrorCode::FormatViolation => "FormatViolation",
            ErrorCode::PropertyConstraintViolation => "PropertyConstraintViolation",
            ErrorCode::OccurrenceConstraintViolation => "OccurrenceConstraintViolation",
            ErrorCode::TypeConstraintViolation => "TypeConstraintViolation",
            ErrorCode::GenericError => "GenericError",
            ErrorCode::MessageTypeNotSupported => "MessageTypeNotSupported",
            ErrorCode::RpcFrameworkError => "RpcFrameworkError",
        }
    }

    /// True for both spellings of the envelope format error
    pub fn is_format_violation(&self) -> bool {
        matches!(self, ErrorCode::FormationViolation | ErrorCode::FormatViolation)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ErrorCode {
    type Err = OcppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(Value::String(s.to_string()))
            .map_err(|_| OcppError::Protocol(ProtocolError::new(
                ErrorCode::GenericError,
                format!("unknown error code {s}"),
            )))
    }
}

/// Protocol error as exchanged in a CALLERROR frame
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{code}: {description}")]
pub struct ProtocolError {
    pub code: ErrorCode,
    pub description: String,
    /// Always a JSON object, possibly empty
    pub details: Value,
}

impl ProtocolError {
    pub fn new(code: ErrorCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            details: Value::Object(Map::new()),
        }
    }

    /// Attach free-form details. Non-object values are wrapped as `{"details": value}`.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = match details {
            Value::Object(_) => details,
            Value::Null => Value::Object(Map::new()),
            other => {
                let mut map = Map::new();
                map.insert("details".to_string(), other);
                Value::Object(map)
            }
        };
        self
    }
}

/// Errors surfaced by the local OCPP-J API
#[derive(Debug, Error)]
pub enum OcppError {
    /// The peer (or a handler) produced a typed protocol error
    #[error("protocol error {0}")]
    Protocol(#[from] ProtocolError),

    #[error("validation failed: {0}")]
    Validation(#[from] Violation),

    #[error("unsupported action {action} on {side}")]
    UnsupportedAction { action: String, side: &'static str },

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("request queue full (capacity {0})")]
    QueueFull(usize),

    #[error("timeout waiting for response to message {0}")]
    Timeout(String),

    #[error("connection lost")]
    ConnectionLost,

    #[error("not connected")]
    NotConnected,

    #[error("unknown peer: {0}")]
    UnknownPeer(String),

    #[error("message id {0} is already in use")]
    DuplicateMessageId(String),

    #[error("action {0} is registered by more than one feature")]
    DuplicateAction(String),

    #[error("endpoint already started")]
    AlreadyStarted,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Untyped application failure
    #[error("{0}")]
    Application(String),
}

impl OcppError {
    /// Untyped application error; reported to the peer as `InternalError`
    pub fn application(message: impl Into<String>) -> Self {
        OcppError::Application(message.into())
    }

    /// Typed protocol error; reported to the peer verbatim
    pub fn protocol(code: ErrorCode, description: impl Into<String>) -> Self {
        OcppError::Protocol(ProtocolError::new(code, description))
    }

    /// Wire error code, if this error is (or wraps) a protocol error
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            OcppError::Protocol(err) => Some(err.code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_round_trip() {
        for code in [
            ErrorCode::NotImplemented,
            ErrorCode::FormationViolation,
            ErrorCode::FormatViolation,
            ErrorCode::OccurrenceConstraintViolation,
            ErrorCode::RpcFrameworkError,
        ] {
            let parsed: ErrorCode = code.as_str().parse().unwrap();
            assert_eq!(parsed, code);
        }
    }

    #[test]
    fn test_ocpp16_occurrence_spelling_accepted() {
        let code: ErrorCode = "OccurenceConstraintViolation".parse().unwrap();
        assert_eq!(code, ErrorCode::OccurrenceConstraintViolation);
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert!("Teapot".parse::<ErrorCode>().is_err());
    }

    #[test]
    fn test_details_always_object() {
        let err = ProtocolError::new(ErrorCode::GenericError, "x").with_details(Value::Null);
        assert!(err.details.as_object().unwrap().is_empty());

        let err = ProtocolError::new(ErrorCode::GenericError, "x")
            .with_details(serde_json::json!("reason"));
        assert_eq!(err.details["details"], "reason");
    }
}
