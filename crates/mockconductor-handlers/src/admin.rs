//! Admin (master) interface namespace
//!
//! `admin/agent/{list,add}`, `admin/instance/{add,start}` and
//! `admin/interface/add_instance`. Agents added here live for the lifetime
//! of the process.

use crate::registry::{handler_fn, Node};
use mockconductor_core::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub id: String,
    pub name: Option<String>,
    pub public_address: Option<String>,
    pub keystore_file: String,
    pub holo_remote_key: bool,
    pub test_agent: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct AddAgentArgs {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    holo_remote_key: Option<String>,
}

#[derive(Default)]
pub struct AdminApi {
    agents: Mutex<Vec<AgentRecord>>,
}

impl AdminApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Agents in the order they were first added.
    pub async fn list_agents(&self) -> Vec<AgentRecord> {
        self.agents.lock().await.clone()
    }

    /// Store an agent whose key is held remotely. Re-adding an id replaces it.
    pub async fn add_agent(&self, args: &Value) -> bool {
        let parsed: AddAgentArgs = match serde_json::from_value(args.clone()) {
            Ok(a) => a,
            Err(e) => {
                error!("admin/agent/add rejected: {}", e);
                return false;
            }
        };
        let record = AgentRecord {
            id: parsed.id,
            name: parsed.name,
            public_address: parsed.holo_remote_key,
            keystore_file: "::ignored::".to_string(),
            holo_remote_key: true,
            test_agent: None,
        };
        debug!("Adding agent {} ({:?})", record.id, record.public_address);

        let mut agents = self.agents.lock().await;
        match agents.iter_mut().find(|a| a.id == record.id) {
            Some(existing) => *existing = record,
            None => agents.push(record),
        }
        true
    }

    pub fn namespace(self: &Arc<Self>) -> Node {
        let lister = Arc::clone(self);
        let adder = Arc::clone(self);
        Node::namespace([(
            "admin",
            Node::namespace([
                (
                    "agent",
                    Node::namespace([
                        (
                            "list",
                            Node::handler(handler_fn(move |_args: Value| {
                                let api = Arc::clone(&lister);
                                async move { Ok(serde_json::to_value(api.list_agents().await)?) }
                            })),
                        ),
                        (
                            "add",
                            Node::handler(handler_fn(move |args: Value| {
                                let api = Arc::clone(&adder);
                                async move {
                                    let success = api.add_agent(&args).await;
                                    Ok(json!({ "success": success }))
                                }
                            })),
                        ),
                    ]),
                ),
                (
                    "instance",
                    Node::namespace([
                        ("add", Node::handler(handler_fn(succeed))),
                        ("start", Node::handler(handler_fn(succeed))),
                    ]),
                ),
                (
                    "interface",
                    Node::namespace([("add_instance", Node::handler(handler_fn(succeed)))]),
                ),
            ]),
        )])
    }
}

async fn succeed(_args: Value) -> Result<Value> {
    Ok(json!({ "success": true }))
}
