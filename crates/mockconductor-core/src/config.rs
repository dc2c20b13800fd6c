//! Conductor configuration
//!
//! Loaded from TOML when a file is given, otherwise defaults. Every section
//! is `#[serde(default)]` so a partial file only overrides what it names.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// The four logical channels a conductor exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceKind {
    #[serde(alias = "master")]
    Admin,
    Service,
    Internal,
    General,
}

impl InterfaceKind {
    pub const ALL: [InterfaceKind; 4] = [
        InterfaceKind::Admin,
        InterfaceKind::Service,
        InterfaceKind::Internal,
        InterfaceKind::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Service => "service",
            Self::Internal => "internal",
            Self::General => "general",
        }
    }
}

impl fmt::Display for InterfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConductorConfig {
    /// Host every interface binds to.
    pub host: String,
    pub interfaces: InterfacePorts,
    pub wormhole: WormholeConfig,
}

impl Default for ConductorConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            interfaces: InterfacePorts::default(),
            wormhole: WormholeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfacePorts {
    #[serde(alias = "master")]
    pub admin: u16,
    pub service: u16,
    pub internal: u16,
    pub general: u16,
}

impl Default for InterfacePorts {
    fn default() -> Self {
        Self {
            admin: 42211,
            service: 42222,
            internal: 42233,
            general: 42244,
        }
    }
}

impl InterfacePorts {
    pub fn port(&self, kind: InterfaceKind) -> u16 {
        match kind {
            InterfaceKind::Admin => self.admin,
            InterfaceKind::Service => self.service,
            InterfaceKind::Internal => self.internal,
            InterfaceKind::General => self.general,
        }
    }

    /// All zeros: every interface picks a free port.
    pub fn ephemeral() -> Self {
        Self {
            admin: 0,
            service: 0,
            internal: 0,
            general: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WormholeConfig {
    /// Where signature requests are POSTed.
    pub url: String,
    /// Milliseconds before a request is abandoned.
    pub timeout_ms: u64,
}

impl Default for WormholeConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9676/".to_string(),
            timeout_ms: 1000,
        }
    }
}

impl ConductorConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Load from `path` if given, otherwise defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}
