//! Command line: flags and `MOCK_CONDUCTOR_*` variables layered over the
//! TOML config file, which is layered over the built-in defaults.

use clap::{Args, Parser, Subcommand};
use mockconductor_core::{ConductorConfig, Result};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "mock-conductor",
    version,
    about = "Mock hosting-network conductor for integration testing"
)]
pub struct Cli {
    #[command(flatten)]
    pub args: ServeArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Serve all four interfaces until interrupted (default)
    Serve,
    /// Print the effective configuration as TOML
    Config,
    /// Show version
    Version,
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// TOML configuration file
    #[arg(short, long, env = "MOCK_CONDUCTOR_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Host every interface binds to
    #[arg(long, env = "MOCK_CONDUCTOR_HOST", global = true)]
    pub host: Option<String>,

    #[arg(long, alias = "master-port", env = "MOCK_CONDUCTOR_ADMIN_PORT", global = true)]
    pub admin_port: Option<u16>,

    #[arg(long, env = "MOCK_CONDUCTOR_SERVICE_PORT", global = true)]
    pub service_port: Option<u16>,

    #[arg(long, env = "MOCK_CONDUCTOR_INTERNAL_PORT", global = true)]
    pub internal_port: Option<u16>,

    #[arg(long, env = "MOCK_CONDUCTOR_GENERAL_PORT", global = true)]
    pub general_port: Option<u16>,

    /// Remote signer endpoint
    #[arg(long, env = "MOCK_CONDUCTOR_WORMHOLE_URL", global = true)]
    pub wormhole_url: Option<String>,

    #[arg(long, env = "MOCK_CONDUCTOR_WORMHOLE_TIMEOUT_MS", global = true)]
    pub wormhole_timeout_ms: Option<u64>,

    /// Fail the first service log_request with a serialization error
    #[arg(long, global = true)]
    pub fail_first_log_request: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

impl ServeArgs {
    /// Defaults, then the config file, then flags.
    pub fn resolve(&self) -> Result<ConductorConfig> {
        let mut config = ConductorConfig::load_or_default(self.config.as_deref())?;
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        let ports = &mut config.interfaces;
        if let Some(p) = self.admin_port {
            ports.admin = p;
        }
        if let Some(p) = self.service_port {
            ports.service = p;
        }
        if let Some(p) = self.internal_port {
            ports.internal = p;
        }
        if let Some(p) = self.general_port {
            ports.general = p;
        }
        if let Some(url) = &self.wormhole_url {
            config.wormhole.url = url.clone();
        }
        if let Some(ms) = self.wormhole_timeout_ms {
            config.wormhole.timeout_ms = ms;
        }
        Ok(config)
    }
}
