//! Namespace registry and handler trait
//!
//! Handlers are declared as an explicit tree of `Node::Namespace` and
//! `Node::Handler` values. `Registry::from_tree` walks it once and stores
//! every handler under its lower-cased, delimiter-joined path. Lookups are
//! exact; an unknown path is always a routing error.

use dashmap::DashMap;
use mockconductor_core::{Error, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// A callable leaf of a namespace.
#[async_trait::async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, args: Value) -> Result<Value>;
}

pub type HandlerRef = Arc<dyn Handler>;

/// Adapts an async closure into a `Handler`.
pub struct FnHandler<F>(F);

#[async_trait::async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send,
{
    async fn call(&self, args: Value) -> Result<Value> {
        (self.0)(args).await
    }
}

pub fn handler_fn<F, Fut>(f: F) -> HandlerRef
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// Node of a handler table.
pub enum Node {
    Namespace(BTreeMap<String, Node>),
    Handler(HandlerRef),
}

impl Node {
    pub fn namespace<I, K>(children: I) -> Self
    where
        I: IntoIterator<Item = (K, Node)>,
        K: Into<String>,
    {
        Self::Namespace(children.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn handler(handler: HandlerRef) -> Self {
        Self::Handler(handler)
    }
}

/// Paths are stored and looked up lower-cased.
fn normalize(path: &str) -> String {
    path.to_lowercase()
}

struct Entry {
    handler: HandlerRef,
    once: bool,
}

pub struct Registry {
    delimiter: char,
    entries: DashMap<String, Entry>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new('/')
    }
}

impl Registry {
    pub fn new(delimiter: char) -> Self {
        Self {
            delimiter,
            entries: DashMap::new(),
        }
    }

    /// Build a registry from a handler table.
    pub fn from_tree(root: Node, delimiter: char) -> Self {
        let registry = Self::new(delimiter);
        let mut segments = Vec::new();
        registry.walk(root, &mut segments);
        registry
    }

    fn walk(&self, node: Node, segments: &mut Vec<String>) {
        match node {
            Node::Namespace(children) => {
                for (name, child) in children {
                    segments.push(name.to_lowercase());
                    self.walk(child, segments);
                    segments.pop();
                }
            }
            Node::Handler(_) if segments.is_empty() => {
                warn!("Handler at the root of a namespace has no path, skipping");
            }
            Node::Handler(handler) => {
                let delimiter = self.delimiter.to_string();
                let path = segments.join(delimiter.as_str());
                self.insert(path, handler, false);
            }
        }
    }

    fn insert(&self, path: String, handler: HandlerRef, once: bool) {
        debug!("Register method: {}", path);
        if self.entries.insert(path.clone(), Entry { handler, once }).is_some() {
            debug!("Replaced existing handler for {}", path);
        }
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Register a handler. Replaces any handler already at that path.
    pub fn register(&self, path: &str, handler: HandlerRef) {
        self.insert(normalize(path), handler, false);
    }

    /// Register a handler that is removed by its first resolution.
    pub fn register_once(&self, path: &str, handler: HandlerRef) {
        self.insert(normalize(path), handler, true);
    }

    pub fn unregister(&self, path: &str) -> bool {
        self.entries.remove(&normalize(path)).is_some()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(&normalize(path))
    }

    /// Exact match on the lower-cased path.
    pub fn resolve(&self, path: &str) -> Result<HandlerRef> {
        let key = normalize(path);
        let once = match self.entries.get(&key) {
            Some(entry) if !entry.once => return Ok(entry.handler.clone()),
            Some(_) => true,
            None => false,
        };
        if once {
            if let Some((_, entry)) = self.entries.remove_if(&key, |_, e| e.once) {
                return Ok(entry.handler);
            }
        }
        // a one-shot entry may have been taken or replaced meanwhile
        self.entries
            .get(&key)
            .map(|e| e.handler.clone())
            .ok_or_else(|| Error::routing(path))
    }

    /// Resolve and invoke in one step.
    pub async fn call(&self, path: &str, args: Value) -> Result<Value> {
        let handler = self.resolve(path)?;
        handler.call(args).await
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
