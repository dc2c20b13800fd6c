//! Mock conductor - a stand-in hosting-network node for integration tests
//!
//! Serves four JSON-RPC over WebSocket interfaces (admin, service, internal,
//! general), verifies and content-addresses service activity logs, and can
//! ask an out-of-band wormhole signer for detached signatures.

pub mod cli;

pub use mockconductor_core::{
    address, address_of, canonical_string, canonicalize, verify, Address, AgentId, CallSpec,
    ConductorConfig, Error, InterfaceKind, InterfacePorts, Result, RpcRequest, RpcResponse,
    WormholeConfig,
};
pub use mockconductor_handlers::{handler_fn, FaultToggle, Handler, HandlerRef, Registry};
pub use mockconductor_server::{Conductor, InterfaceServer};
pub use mockconductor_wormhole::WormholeClient;
