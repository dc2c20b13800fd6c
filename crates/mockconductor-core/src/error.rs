//! Error types for the mock conductor
//!
//! Every failure a handler can produce is a distinct variant so callers can
//! branch on the kind. `kind()` and `code()` give the stable wire rendering.

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// One field that failed boundary validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    /// Dotted path of the field, e.g. `request.call_spec.hha_hash`.
    pub field: String,
    /// What the field should have been.
    pub expected: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
        }
    }
}

fn describe(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{} (expected {})", v.field, v.expected))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("method not found: {path}")]
    Routing { path: String },

    #[error("invalid input: {}", describe(.violations))]
    Schema { violations: Vec<FieldViolation> },

    #[error("signature does not match {payload} payload")]
    Signature { payload: String },

    #[error("invalid {field}: {value}")]
    Format { field: String, value: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("status of response from service is not success: {status}: {body}")]
    Service { status: u16, body: String },

    #[error("internal fault: {0}")]
    Internal(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("malformed {what}: {reason}")]
    Encoding { what: &'static str, reason: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn routing(path: impl Into<String>) -> Self {
        Self::Routing { path: path.into() }
    }

    pub fn schema(violations: Vec<FieldViolation>) -> Self {
        Self::Schema { violations }
    }

    pub fn signature(payload: impl Into<String>) -> Self {
        Self::Signature {
            payload: payload.into(),
        }
    }

    pub fn format(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Format {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn encoding(what: &'static str, reason: impl Into<String>) -> Self {
        Self::Encoding {
            what,
            reason: reason.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Stable kind tag carried in the `data` of an RPC error.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Routing { .. } => "RoutingError",
            Self::Schema { .. } => "SchemaError",
            Self::Signature { .. } => "SignatureError",
            Self::Format { .. } => "FormatError",
            Self::Transport(_) => "TransportError",
            Self::Service { .. } => "ServiceError",
            Self::Serialization(_) => "SerializationError",
            Self::Encoding { .. } => "EncodingError",
            Self::Internal(_) | Self::Config(_) | Self::Io(_) | Self::Json(_) => "InternalFault",
        }
    }

    /// JSON-RPC error code.
    pub fn code(&self) -> i32 {
        match self {
            Self::Routing { .. } => -32601,
            Self::Schema { .. } | Self::Encoding { .. } => -32602,
            Self::Signature { .. } => -32001,
            Self::Format { .. } => -32002,
            Self::Transport(_) => -32003,
            Self::Service { .. } => -32004,
            Self::Serialization(_) => -32005,
            Self::Internal(_) | Self::Config(_) | Self::Io(_) | Self::Json(_) => -32603,
        }
    }

    /// Faults in the mock itself. The interface that hit one shuts down.
    pub fn is_fatal(&self) -> bool {
        self.kind() == "InternalFault"
    }

    /// Structured detail for the RPC error `data` member.
    pub fn data(&self) -> Value {
        match self {
            Self::Routing { path } => json!({ "kind": self.kind(), "path": path }),
            Self::Schema { violations } => {
                json!({ "kind": self.kind(), "violations": violations })
            }
            Self::Signature { payload } => json!({ "kind": self.kind(), "payload": payload }),
            Self::Format { field, value } => {
                json!({ "kind": self.kind(), "field": field, "value": value })
            }
            Self::Service { status, body } => {
                json!({ "kind": self.kind(), "status": status, "body": body })
            }
            Self::Encoding { what, reason } => {
                json!({ "kind": self.kind(), "what": what, "reason": reason })
            }
            _ => json!({ "kind": self.kind() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_message_lists_every_field() {
        let err = Error::schema(vec![
            FieldViolation::new("agent_id", "agent_id"),
            FieldViolation::new("request.timestamp", "string"),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("agent_id (expected agent_id)"));
        assert!(msg.contains("request.timestamp (expected string)"));
        assert_eq!(err.data()["violations"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn only_internal_faults_are_fatal() {
        assert!(Error::internal("boom").is_fatal());
        assert!(Error::Config("bad".into()).is_fatal());
        assert!(!Error::routing("admin/nope").is_fatal());
        assert!(!Error::signature("request").is_fatal());
        assert!(!Error::Transport("timeout".into()).is_fatal());
    }

    #[test]
    fn format_error_carries_value() {
        let err = Error::format("request.timestamp", "not-a-date");
        assert_eq!(err.kind(), "FormatError");
        assert_eq!(err.data()["value"], "not-a-date");
        assert_eq!(err.code(), -32002);
    }
}
