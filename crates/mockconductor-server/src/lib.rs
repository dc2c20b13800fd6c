//! Mock conductor server - one WebSocket JSON-RPC listener per interface
//!
//! Each `InterfaceServer` owns its listener and registry; `Conductor` wires
//! the four standard interfaces to the admin, service-log and installed-app
//! handler tables.

pub mod conductor;
pub mod interface;
mod ws;

pub use conductor::Conductor;
pub use interface::InterfaceServer;
