//! Installed applications reachable through the internal interface
//!
//! The internal `call` verb looks up `instance_id` here first, then resolves
//! `zome/function` in that application's own registry.

use crate::registry::{handler_fn, HandlerRef, Node, Registry};
use mockconductor_core::{zome_ok, Error, Result};
use serde_json::{json, Value};
use std::collections::HashMap;

pub const HAPP_STORE: &str = "happ-store";
pub const HOLO_HOSTING_APP: &str = "holo-hosting-app";

pub struct InstalledApps {
    apps: HashMap<String, Registry>,
}

impl Default for InstalledApps {
    fn default() -> Self {
        let mut apps = HashMap::new();
        apps.insert(HAPP_STORE.to_string(), Registry::from_tree(happ_store(), '/'));
        apps.insert(
            HOLO_HOSTING_APP.to_string(),
            Registry::from_tree(holo_hosting_app(), '/'),
        );
        Self { apps }
    }
}

impl InstalledApps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instance_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.apps.keys().map(String::as_str).collect();
        ids.sort();
        ids
    }

    pub fn resolve(&self, instance_id: &str, path: &str) -> Result<HandlerRef> {
        self.apps
            .get(instance_id)
            .ok_or_else(|| Error::routing(format!("{}::{}", instance_id, path)))?
            .resolve(path)
            .map_err(|_| Error::routing(format!("{}::{}", instance_id, path)))
    }
}

fn happ_store() -> Node {
    Node::namespace([(
        "happs",
        Node::namespace([("get_app", Node::handler(handler_fn(get_app)))]),
    )])
}

fn holo_hosting_app() -> Node {
    Node::namespace([(
        "provider",
        Node::namespace([(
            "get_app_details",
            Node::handler(handler_fn(get_app_details)),
        )]),
    )])
}

async fn get_app(_args: Value) -> Result<Value> {
    Ok(zome_ok(json!({
        "address": "made_up_happ_store_hash",
        "app_entry": {
            "title": "Holofuel",
            "author": "Holo Inc.",
            "description": "Distributed currency optimized for billions of daily microtransactions, mutual-credit, reserve accounts, simultaneous settlement. No TPS limits.",
            "thumbnail_url": "https://holofuel.com/favicon.ico",
            "homepage_url": "https://holofuel.com",
            "dnas": [{
                "location": "https://cdn.holo.host/holofuel/QmUx7qjbKy97vqy3Yh8TDpm64faZKfPundNP5r98i92xKS.json",
                "hash": "QmUx7qjbKy97vqy3Yh8TDpm64faZKfPundNP5r98i92xKS",
                "handle": "holofuel",
            }],
            "ui": "",
        },
        "upvotes": 7_750_000_000u64,
        "upvoted_by_me": true,
    })))
}

async fn get_app_details(_args: Value) -> Result<Value> {
    Ok(zome_ok(json!({
        "app_bundle": {
            "happ_hash": "made_up_happ_store_hash",
        },
        "payment_pref": [{
            "provider_address": "HcSCiWB7KKaQnsqkto6Q88rhmpwg63Zcdw448O7DkyiKXbrwpCrGMHtc747jjoi",
            "dna_bundle_hash": "QmWyvE7wTJbaDorg13dZbUA8KAYvxwU5M3gFXc1yYgXkav",
            "max_fuel_per_invoice": 10_000,
            "max_unpaid_value": 10_000,
            "price_per_unit": 1,
        }],
    })))
}
