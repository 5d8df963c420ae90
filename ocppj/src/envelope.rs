//! OCPP-J message framing
//!
//! Every frame is a JSON array with a leading message type:
//! - CALL: [2, messageId, action, payload]
//! - CALLRESULT: [3, messageId, payload]
//! - CALLERROR: [4, messageId, errorCode, errorDescription, errorDetails]
//!
//! Payloads stay as raw JSON here; typed decoding happens in the endpoint,
//! which knows the feature (for a CALLRESULT, through the pending request).

use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::{ErrorCode, ProtocolError};

/// OCPP message type identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Call = 2,
    CallResult = 3,
    CallError = 4,
}

impl MessageType {
    fn from_id(id: u64) -> Option<Self> {
        match id {
            2 => Some(MessageType::Call),
            3 => Some(MessageType::CallResult),
            4 => Some(MessageType::CallError),
            _ => None,
        }
    }

    /// Number of array elements a frame of this type carries
    fn arity(&self) -> usize {
        match self {
            MessageType::Call => 4,
            MessageType::CallResult => 3,
            MessageType::CallError => 5,
        }
    }
}

/// A frame that could not be decoded
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{description}")]
pub struct EnvelopeError {
    /// Message id, when it could be recovered from the frame
    pub message_id: Option<String>,
    pub description: String,
}

impl EnvelopeError {
    fn new(message_id: Option<&str>, description: impl Into<String>) -> Self {
        Self {
            message_id: message_id.map(str::to_string),
            description: description.into(),
        }
    }
}

/// OCPP CALL message (request)
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub message_id: String,
    pub action: String,
    pub payload: Value,
}

/// OCPP CALLRESULT message (success response)
#[derive(Debug, Clone, PartialEq)]
pub struct CallResult {
    pub message_id: String,
    pub payload: Value,
}

/// OCPP CALLERROR message (error response)
#[derive(Debug, Clone, PartialEq)]
pub struct CallError {
    pub message_id: String,
    pub error_code: ErrorCode,
    pub error_description: String,
    pub error_details: Value,
}

impl CallError {
    pub fn new(
        message_id: impl Into<String>,
        error_code: ErrorCode,
        error_description: impl Into<String>,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            error_code,
            error_description: error_description.into(),
            error_details: Value::Object(Map::new()),
        }
    }

    pub fn from_protocol_error(message_id: impl Into<String>, error: ProtocolError) -> Self {
        Self {
            message_id: message_id.into(),
            error_code: error.code,
            error_description: error.description,
            error_details: error.details,
        }
    }

    pub fn to_protocol_error(&self) -> ProtocolError {
        ProtocolError::new(self.error_code, self.error_description.clone())
            .with_details(self.error_details.clone())
    }
}

/// Parsed OCPP message (any type)
#[derive(Debug, Clone, PartialEq)]
pub enum OcppMessage {
    Call(Call),
    CallResult(CallResult),
    CallError(CallError),
}

impl OcppMessage {
    /// Parse an OCPP message from a text frame
    pub fn parse(text: &str) -> Result<Self, EnvelopeError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| EnvelopeError::new(None, format!("invalid JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Parse an OCPP message from an already decoded JSON value
    pub fn from_value(value: Value) -> Result<Self, EnvelopeError> {
        let Value::Array(mut array) = value else {
            return Err(EnvelopeError::new(None, "message is not a JSON array"));
        };

        let message_id = array.get(1).and_then(Value::as_str).map(str::to_string);

        let msg_type = array
            .first()
            .and_then(Value::as_u64)
            .and_then(MessageType::from_id)
            .ok_or_else(|| EnvelopeError::new(message_id.as_deref(), "invalid message type"))?;

        if array.len() != msg_type.arity() {
            return Err(EnvelopeError::new(
                message_id.as_deref(),
                format!(
                    "invalid message: expected {} elements for {:?}, got {}",
                    msg_type.arity(),
                    msg_type,
                    array.len()
                ),
            ));
        }

        let message_id = message_id
            .ok_or_else(|| EnvelopeError::new(None, "message id is not a string"))?;
        let id = Some(message_id.as_str());

        match msg_type {
            MessageType::Call => {
                let action = array[2]
                    .as_str()
                    .ok_or_else(|| EnvelopeError::new(id, "action is not a string"))?
                    .to_string();
                let payload = expect_object(array.pop(), id, "payload")?;

                Ok(OcppMessage::Call(Call {
                    message_id,
                    action,
                    payload,
                }))
            }
            MessageType::CallResult => {
                let payload = expect_object(array.pop(), id, "payload")?;

                Ok(OcppMessage::CallResult(CallResult {
                    message_id,
                    payload,
                }))
            }
            MessageType::CallError => {
                let error_details = expect_object(array.pop(), id, "error details")?;
                let error_description = array[3]
                    .as_str()
                    .ok_or_else(|| EnvelopeError::new(id, "error description is not a string"))?
                    .to_string();
                let error_code = array[2]
                    .as_str()
                    .ok_or_else(|| EnvelopeError::new(id, "error code is not a string"))?
                    .parse()
                    .unwrap_or(ErrorCode::GenericError);

                Ok(OcppMessage::CallError(CallError {
                    message_id,
                    error_code,
                    error_description,
                    error_details,
                }))
            }
        }
    }

    /// Get the message ID
    pub fn message_id(&self) -> &str {
        match self {
            OcppMessage::Call(c) => &c.message_id,
            OcppMessage::CallResult(r) => &r.message_id,
            OcppMessage::CallError(e) => &e.message_id,
        }
    }

    pub fn message_type(&self) -> MessageType {
        match self {
            OcppMessage::Call(_) => MessageType::Call,
            OcppMessage::CallResult(_) => MessageType::CallResult,
            OcppMessage::CallError(_) => MessageType::CallError,
        }
    }

    /// Serialize to the wire representation
    pub fn to_value(&self) -> Value {
        match self {
            OcppMessage::Call(c) => serde_json::json!([
                MessageType::Call as u8,
                c.message_id,
                c.action,
                c.payload
            ]),
            OcppMessage::CallResult(r) => serde_json::json!([
                MessageType::CallResult as u8,
                r.message_id,
                r.payload
            ]),
            OcppMessage::CallError(e) => {
                let details = match &e.error_details {
                    Value::Object(_) => e.error_details.clone(),
                    _ => Value::Object(Map::new()),
                };
                serde_json::json!([
                    MessageType::CallError as u8,
                    e.message_id,
                    e.error_code.as_str(),
                    e.error_description,
                    details
                ])
            }
        }
    }

    /// Serialize to a text frame
    pub fn to_text(&self) -> String {
        self.to_value().to_string()
    }
}

fn expect_object(value: Option<Value>, id: Option<&str>, what: &str) -> Result<Value, EnvelopeError> {
    match value {
        Some(value @ Value::Object(_)) => Ok(value),
        _ => Err(EnvelopeError::new(id, format!("{what} is not a JSON object"))),
    }
}
