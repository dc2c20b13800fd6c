//! The generic `call` verb of the service and internal interfaces
//!
//! Both take a `CallSpec` and forward its `args` to a second-level lookup:
//! the service interface resolves `zome/function` in the service logger's
//! registry, the internal interface first picks an installed application by
//! `instance_id`.

use crate::instances::InstalledApps;
use crate::registry::{handler_fn, HandlerRef, Registry};
use mockconductor_core::{CallSpec, Error};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

fn arg_keys(args: &Value) -> String {
    args.as_object()
        .map(|m| m.keys().cloned().collect::<Vec<_>>().join(", "))
        .unwrap_or_default()
}

/// `call` handler for the service interface.
pub fn zome_call(zomes: Arc<Registry>) -> HandlerRef {
    handler_fn(move |params: Value| {
        let zomes = Arc::clone(&zomes);
        async move {
            let spec = CallSpec::from_params(&params)?;
            debug!(
                "Call to 'service' interface: {}/{}( {} )",
                spec.zome,
                spec.function,
                arg_keys(&spec.args)
            );
            zomes.call(&spec.path(), spec.args).await
        }
    })
}

/// `call` handler for the internal interface.
pub fn instance_call(apps: Arc<InstalledApps>) -> HandlerRef {
    handler_fn(move |params: Value| {
        let apps = Arc::clone(&apps);
        async move {
            let spec = CallSpec::from_params(&params)?;
            let instance_id = spec
                .instance_id
                .clone()
                .ok_or_else(|| Error::routing(format!("<no instance>::{}", spec.path())))?;
            debug!(
                "Call to 'internal' interface: {}::{}/{}( {} )",
                instance_id,
                spec.zome,
                spec.function,
                arg_keys(&spec.args)
            );
            let handler = apps.resolve(&instance_id, &spec.path())?;
            handler.call(spec.args).await
        }
    })
}
