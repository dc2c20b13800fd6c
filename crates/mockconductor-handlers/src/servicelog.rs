//! Service activity log: request, response and confirmation entries
//!
//! Each entry is validated at the boundary, signature-checked where the
//! entry carries a signature, and committed by returning the content address
//! of its canonical form. Entries chain by address: a response names the
//! request commit, a confirmation names the response commit.

use crate::fault::FaultToggle;
use crate::registry::{handler_fn, Node};
use crate::schema::Validator;
use mockconductor_core::signature::verify;
use mockconductor_core::{address_of, zome_ok, Address, AgentId, Error, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Detail reported when the one-shot serialization fault fires.
pub const SERIALIZATION_FAULT: &str = "Cannot decompress Edwards point at line 1 column 208";

/// What the host called on behalf of the agent.
#[derive(Debug, Clone)]
pub struct HostedCallSpec {
    pub hha_hash: Address,
    pub dna_alias: String,
    pub zome: String,
    pub function: String,
    pub args_hash: Address,
}

#[derive(Debug, Clone)]
pub struct ActivityLogRequest {
    pub agent_id: AgentId,
    pub timestamp: String,
    pub host_id: AgentId,
    pub call_spec: HostedCallSpec,
    pub request_signature: String,
    /// The signed object exactly as received.
    pub request: Value,
}

impl ActivityLogRequest {
    pub fn from_args(args: &Value) -> Result<Self> {
        let mut v = Validator::new(args);
        let agent_id = v.agent_id("agent_id");
        let request = v.object("request");
        let timestamp = v.string("request.timestamp");
        let host_id = v.agent_id("request.host_id");
        v.object("request.call_spec");
        let hha_hash = v.hash("request.call_spec.hha_hash");
        let dna_alias = v.string("request.call_spec.dna_alias");
        let zome = v.string("request.call_spec.zome");
        let function = v.string("request.call_spec.function");
        let args_hash = v.hash("request.call_spec.args_hash");
        let request_signature = v.signature("request_signature");
        v.finish(|| {
            Some(Self {
                agent_id: agent_id?,
                timestamp,
                host_id: host_id?,
                call_spec: HostedCallSpec {
                    hha_hash: hha_hash?,
                    dna_alias,
                    zome,
                    function,
                    args_hash: args_hash?,
                },
                request_signature,
                request,
            })
        })
    }
}

#[derive(Debug, Clone)]
pub struct ActivityLogResponse {
    pub request_commit: Address,
    pub response_hash: Address,
    pub host_metrics: Value,
    pub entries: Vec<Value>,
}

impl ActivityLogResponse {
    pub fn from_args(args: &Value) -> Result<Self> {
        let mut v = Validator::new(args);
        let request_commit = v.hash("request_commit");
        let response_hash = v.hash("response_hash");
        let host_metrics = v.object("host_metrics");
        let entries = v.array("entries");
        v.finish(|| {
            Some(Self {
                request_commit: request_commit?,
                response_hash: response_hash?,
                host_metrics,
                entries,
            })
        })
    }
}

#[derive(Debug, Clone)]
pub struct ActivityLogConfirmation {
    pub agent_id: AgentId,
    pub response_commit: Address,
    pub response_hash: Address,
    pub duration: String,
    pub confirmation_signature: String,
    /// The signed object exactly as received.
    pub confirmation: Value,
}

impl ActivityLogConfirmation {
    pub fn from_args(args: &Value) -> Result<Self> {
        let mut v = Validator::new(args);
        let agent_id = v.agent_id("agent_id");
        let response_commit = v.hash("response_commit");
        let confirmation = v.object("confirmation");
        let response_hash = v.hash("confirmation.response_hash");
        v.object("confirmation.client_metrics");
        let duration = v.string("confirmation.client_metrics.duration");
        let confirmation_signature = v.signature("confirmation_signature");
        v.finish(|| {
            Some(Self {
                agent_id: agent_id?,
                response_commit: response_commit?,
                response_hash: response_hash?,
                duration,
                confirmation_signature,
                confirmation,
            })
        })
    }
}

fn is_iso8601(value: &str) -> bool {
    chrono::DateTime::parse_from_rfc3339(value).is_ok()
        || chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
}

/// Handlers for the `service` zome of the service logger.
pub struct ServiceLogger {
    fault: FaultToggle,
}

impl ServiceLogger {
    pub fn new(fault: FaultToggle) -> Self {
        Self { fault }
    }

    pub fn fault(&self) -> &FaultToggle {
        &self.fault
    }

    pub fn log_request(&self, args: &Value) -> Result<Address> {
        if self.fault.take() {
            warn!("Serialization fault armed, failing this log_request");
            return Err(Error::Serialization(SERIALIZATION_FAULT.to_string()));
        }

        let entry = ActivityLogRequest::from_args(args)?;

        if !verify(entry.agent_id.as_str(), &entry.request, &entry.request_signature)? {
            error!(agent = %entry.agent_id, "Request signature does not verify");
            return Err(Error::signature("request"));
        }

        if !is_iso8601(&entry.timestamp) {
            error!("Unparseable request timestamp '{}'", entry.timestamp);
            return Err(Error::format("request.timestamp", entry.timestamp));
        }

        let address = address_of(args);
        info!(%address, host = %entry.host_id, "Committed service log request");
        Ok(address)
    }

    pub fn log_response(&self, args: &Value) -> Result<Address> {
        let entry = ActivityLogResponse::from_args(args)?;
        let address = address_of(args);
        info!(%address, request = %entry.request_commit, "Committed service log response");
        Ok(address)
    }

    pub fn log_service(&self, args: &Value) -> Result<Address> {
        let entry = ActivityLogConfirmation::from_args(args)?;

        if !verify(
            entry.agent_id.as_str(),
            &entry.confirmation,
            &entry.confirmation_signature,
        )? {
            error!(agent = %entry.agent_id, "Confirmation signature does not verify");
            return Err(Error::signature("confirmation"));
        }

        let address = address_of(args);
        info!(%address, response = %entry.response_commit, "Committed service confirmation");
        Ok(address)
    }

    /// `service/{log_request,log_response,log_service}`, each result tagged `Ok`.
    pub fn namespace(self: &Arc<Self>) -> Node {
        let request = Arc::clone(self);
        let response = Arc::clone(self);
        let service = Arc::clone(self);
        Node::namespace([(
            "service",
            Node::namespace([
                (
                    "log_request",
                    Node::handler(handler_fn(move |args: Value| {
                        let result = request.log_request(&args);
                        async move { result.map(|a| zome_ok(Value::String(a.into_string()))) }
                    })),
                ),
                (
                    "log_response",
                    Node::handler(handler_fn(move |args: Value| {
                        let result = response.log_response(&args);
                        async move { result.map(|a| zome_ok(Value::String(a.into_string()))) }
                    })),
                ),
                (
                    "log_service",
                    Node::handler(handler_fn(move |args: Value| {
                        let result = service.log_service(&args);
                        async move { result.map(|a| zome_ok(Value::String(a.into_string()))) }
                    })),
                ),
            ]),
        )])
    }
}
