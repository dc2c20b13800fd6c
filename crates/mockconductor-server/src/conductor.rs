//! The mock conductor: four interfaces plus the state they share

use crate::interface::InterfaceServer;
use mockconductor_core::{ConductorConfig, Error, InterfaceKind, Result};
use mockconductor_handlers::dispatch::{instance_call, zome_call};
use mockconductor_handlers::{AdminApi, FaultToggle, InstalledApps, Registry, ServiceLogger};
use mockconductor_wormhole::WormholeClient;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

pub struct Conductor {
    admin: InterfaceServer,
    service: InterfaceServer,
    internal: InterfaceServer,
    general: InterfaceServer,
    agents: Arc<AdminApi>,
    fault: FaultToggle,
    wormhole: WormholeClient,
}

impl Conductor {
    pub async fn start(config: &ConductorConfig) -> Result<Self> {
        Self::start_with_fault(config, FaultToggle::new()).await
    }

    /// Start with a fault toggle the caller keeps a handle to.
    pub async fn start_with_fault(config: &ConductorConfig, fault: FaultToggle) -> Result<Self> {
        let wormhole = WormholeClient::new(&config.wormhole)?;
        let agents = Arc::new(AdminApi::new());
        let logger = Arc::new(ServiceLogger::new(fault.clone()));
        let ports = &config.interfaces;
        let host = config.host.as_str();

        let admin = InterfaceServer::bind(
            InterfaceKind::Admin,
            host,
            ports.admin,
            Arc::new(Registry::from_tree(agents.namespace(), '/')),
        )
        .await?;

        let service_registry = Registry::new('/');
        service_registry.register(
            "call",
            zome_call(Arc::new(Registry::from_tree(logger.namespace(), '/'))),
        );
        let service = InterfaceServer::bind(
            InterfaceKind::Service,
            host,
            ports.service,
            Arc::new(service_registry),
        )
        .await?;

        let internal_registry = Registry::new('/');
        internal_registry.register("call", instance_call(Arc::new(InstalledApps::new())));
        let internal = InterfaceServer::bind(
            InterfaceKind::Internal,
            host,
            ports.internal,
            Arc::new(internal_registry),
        )
        .await?;

        let general = InterfaceServer::bind(
            InterfaceKind::General,
            host,
            ports.general,
            Arc::new(Registry::new('/')),
        )
        .await?;

        let conductor = Self {
            admin,
            service,
            internal,
            general,
            agents,
            fault,
            wormhole,
        };
        info!(
            "Mock conductor up: {}",
            conductor
                .interfaces()
                .iter()
                .map(|i| format!("{} ({})", i.local_addr(), i.kind()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(conductor)
    }

    pub fn interface(&self, kind: InterfaceKind) -> &InterfaceServer {
        match kind {
            InterfaceKind::Admin => &self.admin,
            InterfaceKind::Service => &self.service,
            InterfaceKind::Internal => &self.internal,
            InterfaceKind::General => &self.general,
        }
    }

    pub fn interfaces(&self) -> [&InterfaceServer; 4] {
        [&self.admin, &self.service, &self.internal, &self.general]
    }

    pub fn admin(&self) -> &InterfaceServer {
        &self.admin
    }

    pub fn service(&self) -> &InterfaceServer {
        &self.service
    }

    pub fn internal(&self) -> &InterfaceServer {
        &self.internal
    }

    pub fn general(&self) -> &InterfaceServer {
        &self.general
    }

    pub fn agents(&self) -> &Arc<AdminApi> {
        &self.agents
    }

    /// Arm to make the next `log_request` fail with a serialization error.
    pub fn fault(&self) -> &FaultToggle {
        &self.fault
    }

    /// The configured signer client; clone it into handlers that need
    /// signatures.
    pub fn wormhole(&self) -> &WormholeClient {
        &self.wormhole
    }

    pub async fn wormhole_request(&self, agent_id: &str, payload: &Value) -> Result<String> {
        self.wormhole.request_signature(agent_id, payload).await
    }

    /// The first interface to stop on a handler fault.
    pub async fn fatal(&self) -> (InterfaceKind, Error) {
        tokio::select! {
            e = self.admin.fatal() => (InterfaceKind::Admin, e),
            e = self.service.fatal() => (InterfaceKind::Service, e),
            e = self.internal.fatal() => (InterfaceKind::Internal, e),
            e = self.general.fatal() => (InterfaceKind::General, e),
        }
    }

    pub async fn stop(&self) {
        info!(
            "Closing interfaces: {}",
            InterfaceKind::ALL.map(|k| k.as_str()).join(", ")
        );
        futures::join!(
            self.admin.close(),
            self.service.close(),
            self.internal.close(),
            self.general.close(),
        );
    }
}
