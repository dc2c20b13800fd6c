//! Boundary validation of structured call arguments
//!
//! A `Validator` checks fields by dotted path and keeps going after a
//! failure, so the resulting `SchemaError` lists every violated field.
//! Children of a field that already failed are not reported again.

use mockconductor_core::signature::decode_signature;
use mockconductor_core::{AgentId, Address, Error, FieldViolation, Result};
use serde_json::Value;

pub struct Validator<'a> {
    root: &'a Value,
    violations: Vec<FieldViolation>,
}

impl<'a> Validator<'a> {
    pub fn new(root: &'a Value) -> Self {
        let mut violations = Vec::new();
        if !root.is_object() {
            violations.push(FieldViolation::new("args", "object"));
        }
        Self { root, violations }
    }

    fn shadowed(&self, path: &str) -> bool {
        self.violations.iter().any(|v| {
            v.field == "args" || (path.starts_with(&v.field) && path[v.field.len()..].starts_with('.'))
        })
    }

    fn lookup(&self, path: &str) -> Option<&'a Value> {
        path.split('.').try_fold(self.root, |node, key| node.get(key))
    }

    fn check<T>(
        &mut self,
        path: &str,
        expected: &str,
        accept: impl FnOnce(&'a Value) -> Option<T>,
    ) -> Option<T> {
        if self.shadowed(path) {
            return None;
        }
        let found = self.lookup(path).and_then(accept);
        if found.is_none() {
            self.violations.push(FieldViolation::new(path, expected));
        }
        found
    }

    pub fn string(&mut self, path: &str) -> String {
        self.check(path, "string", |v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    pub fn object(&mut self, path: &str) -> Value {
        self.check(path, "object", |v| v.is_object().then(|| v.clone()))
            .unwrap_or(Value::Null)
    }

    pub fn array(&mut self, path: &str) -> Vec<Value> {
        self.check(path, "array", |v| v.as_array().cloned())
            .unwrap_or_default()
    }

    pub fn agent_id(&mut self, path: &str) -> Option<AgentId> {
        self.check(path, "agent_id", |v| v.as_str().and_then(|s| AgentId::parse(s).ok()))
    }

    pub fn hash(&mut self, path: &str) -> Option<Address> {
        self.check(path, "hash", |v| v.as_str().and_then(|s| Address::decode(s).ok()))
    }

    pub fn signature(&mut self, path: &str) -> String {
        self.check(path, "signature", |v| {
            v.as_str()
                .filter(|s| decode_signature(s).is_ok())
                .map(str::to_string)
        })
        .unwrap_or_default()
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Build the typed value if nothing failed.
    pub fn finish<T>(self, build: impl FnOnce() -> Option<T>) -> Result<T> {
        if !self.violations.is_empty() {
            return Err(Error::schema(self.violations));
        }
        build().ok_or_else(|| Error::internal("validated fields missing after validation"))
    }
}
