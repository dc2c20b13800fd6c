//! Mock conductor handlers - namespace registry and the handler tables
//! mounted on each interface.
//!
//! To add a handler: put it in the relevant namespace tree (admin,
//! service logger, installed apps), or register it at runtime on a
//! running interface.

pub mod admin;
pub mod dispatch;
pub mod fault;
pub mod instances;
pub mod registry;
pub mod schema;
pub mod servicelog;

pub use admin::{AdminApi, AgentRecord};
pub use fault::FaultToggle;
pub use instances::InstalledApps;
pub use registry::{handler_fn, Handler, HandlerRef, Node, Registry};
pub use servicelog::{
    ActivityLogConfirmation, ActivityLogRequest, ActivityLogResponse, ServiceLogger,
};
