//! Mock conductor core - wire protocol, errors, config, canonical hashing and signatures

pub mod canonical;
pub mod config;
pub mod error;
pub mod hash;
pub mod protocol;
pub mod signature;

pub use canonical::{canonical_string, canonicalize};
pub use config::{ConductorConfig, InterfaceKind, InterfacePorts, WormholeConfig};
pub use error::{Error, FieldViolation, Result};
pub use hash::{address, address_of, Address};
pub use protocol::*;
pub use signature::{verify, AgentId};
