//! WebSocket protocol - JSON-RPC 2.0 over text frames
//!
//! Wire format:
//!
//! Client → Server (call frame):
//!   { "jsonrpc": "2.0", "id": 7, "method": "admin/agent/list", "params": {} }
//!   { "jsonrpc": "2.0", "id": 8, "method": "call", "params": { "zome": "service", "function": "log_request", "args": { ... } } }
//!
//! Server → Client:
//!   { "jsonrpc": "2.0", "id": 7, "result": [ ... ] }
//!   { "jsonrpc": "2.0", "id": 8, "error": { "code": -32001, "message": "...", "data": { "kind": "SignatureError" } } }

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const JSONRPC_VERSION: &str = "2.0";

/// RPC request from a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

fn default_version() -> String {
    JSONRPC_VERSION.to_string()
}

impl RpcRequest {
    pub fn new(id: impl Into<Value>, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: default_version(),
            id: id.into(),
            method: method.into(),
            params,
        }
    }

    /// The routing unit carried by this request.
    pub fn frame(&self) -> Result<CallFrame> {
        CallFrame::new(self.method.clone(), self.params.clone())
    }
}

/// A path plus its arguments. The path is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct CallFrame {
    pub path: String,
    pub args: Value,
}

impl CallFrame {
    pub fn new(path: impl Into<String>, args: Value) -> Result<Self> {
        let path = path.into();
        if path.trim().is_empty() {
            return Err(Error::routing(path));
        }
        Ok(Self { path, args })
    }

    /// The argument a handler acts on. Positional params use their first
    /// element; named params are passed through unchanged.
    pub fn primary_arg(&self) -> Value {
        primary_arg(&self.args)
    }
}

pub fn primary_arg(params: &Value) -> Value {
    match params {
        Value::Array(items) => items.first().cloned().unwrap_or(Value::Null),
        other => other.clone(),
    }
}

/// RPC response to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: default_version(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn err(id: Value, code: i32, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            jsonrpc: default_version(),
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
                data,
            }),
        }
    }

    /// Render a handler error with its kind tag.
    pub fn from_error(id: Value, error: &Error) -> Self {
        Self::err(id, error.code(), error.to_string(), Some(error.data()))
    }

    /// Frame that could not be decoded at all.
    pub fn parse_error(detail: impl Into<String>) -> Self {
        Self::err(
            Value::Null,
            -32700,
            format!("Parse error: {}", detail.into()),
            Some(json!({ "kind": "ParseError" })),
        )
    }

    /// Valid JSON that is not a request object, e.g. a frame without `method`.
    pub fn invalid_request(id: Value, detail: impl Into<String>) -> Self {
        Self::err(
            id,
            -32600,
            format!("Invalid request: {}", detail.into()),
            Some(json!({ "kind": "InvalidRequest" })),
        )
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// The error kind tag, if this is an error response.
    pub fn error_kind(&self) -> Option<&str> {
        self.error
            .as_ref()
            .and_then(|e| e.data.as_ref())
            .and_then(|d| d.get("kind"))
            .and_then(Value::as_str)
    }
}

/// RPC error detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Parameters of the generic `call` verb on the service and internal
/// interfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    pub zome: String,
    pub function: String,
    #[serde(default)]
    pub args: Value,
}

impl CallSpec {
    pub fn from_params(params: &Value) -> Result<Self> {
        serde_json::from_value(primary_arg(params)).map_err(|e| {
            Error::schema(vec![crate::error::FieldViolation::new(
                "call_spec",
                format!("{{ zome, function, args }} ({})", e),
            )])
        })
    }

    /// Registry path of the target function.
    pub fn path(&self) -> String {
        format!("{}/{}", self.zome, self.function).to_lowercase()
    }
}

/// Tag a successful zome result the way conductor zome calls do.
pub fn zome_ok(value: Value) -> Value {
    json!({ "Ok": value })
}

/// Tag a failed zome result, the counterpart of [`zome_ok`].
pub fn zome_err(value: Value) -> Value {
    json!({ "Err": value })
}
