//! One interface: a listener, its own registry, and its shutdown state

use crate::ws::handle_connection;
use axum::{
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
    Router,
};
use mockconductor_core::{Error, InterfaceKind, Result};
use mockconductor_handlers::{HandlerRef, Registry};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

/// Shared by the accept loop and every connection of one interface.
pub(crate) struct InterfaceState {
    pub(crate) kind: InterfaceKind,
    pub(crate) registry: Arc<Registry>,
    pub(crate) shutdown: CancellationToken,
    /// Connection tasks and the handler tasks they spawn.
    pub(crate) tracker: TaskTracker,
    fatal_tx: watch::Sender<Option<String>>,
}

impl InterfaceState {
    /// Record the first fault and stop the interface.
    pub(crate) fn raise_fatal(&self, fault: &Error) {
        let message = match fault {
            Error::Internal(m) => m.clone(),
            other => other.to_string(),
        };
        self.fatal_tx.send_if_modified(|slot| {
            if slot.is_none() {
                *slot = Some(message);
                true
            } else {
                false
            }
        });
        error!(interface = %self.kind, "Interface stopping after fault: {}", fault);
        self.shutdown.cancel();
    }
}

pub struct InterfaceServer {
    state: Arc<InterfaceState>,
    local_addr: SocketAddr,
    fatal_rx: watch::Receiver<Option<String>>,
    serve: Mutex<Option<JoinHandle<()>>>,
}

impl InterfaceServer {
    /// Bind `host:port` and start accepting WebSocket connections on `/`.
    /// Port 0 picks a free port; see [`local_addr`](Self::local_addr).
    pub async fn bind(
        kind: InterfaceKind,
        host: &str,
        port: u16,
        registry: Arc<Registry>,
    ) -> Result<Self> {
        let listener = TcpListener::bind((host, port)).await?;
        let local_addr = listener.local_addr()?;

        let (fatal_tx, fatal_rx) = watch::channel(None);
        let state = Arc::new(InterfaceState {
            kind,
            registry,
            shutdown: CancellationToken::new(),
            tracker: TaskTracker::new(),
            fatal_tx,
        });

        let app = Router::new()
            .route("/", get(ws_handler))
            .with_state(Arc::clone(&state));

        let shutdown = state.shutdown.clone();
        let serve = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await;
            if let Err(e) = result {
                error!(interface = %kind, "Accept loop failed: {}", e);
            }
        });

        info!("{} interface listening on ws://{}/", kind, local_addr);
        for path in state.registry.paths() {
            debug!("Registered method on {}: {}", kind, path);
        }

        Ok(Self {
            state,
            local_addr,
            fatal_rx,
            serve: Mutex::new(Some(serve)),
        })
    }

    pub fn kind(&self) -> InterfaceKind {
        self.state.kind
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn url(&self) -> String {
        format!("ws://{}/", self.local_addr)
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.state.registry
    }

    pub fn register(&self, path: &str, handler: HandlerRef) {
        self.state.registry.register(path, handler);
    }

    /// Register a handler that is removed after its first call.
    pub fn register_once(&self, path: &str, handler: HandlerRef) {
        self.state.registry.register_once(path, handler);
    }

    pub fn unregister(&self, path: &str) -> bool {
        self.state.registry.unregister(path)
    }

    pub fn is_closed(&self) -> bool {
        self.state.shutdown.is_cancelled()
    }

    /// Resolves once a handler fault has stopped this interface. Never
    /// resolves for an interface that is closed normally.
    pub async fn fatal(&self) -> Error {
        let mut rx = self.fatal_rx.clone();
        let message = match rx.wait_for(Option::is_some).await {
            Ok(slot) => slot.clone().unwrap_or_default(),
            Err(_) => return std::future::pending().await,
        };
        Error::Internal(message)
    }

    /// Stop accepting, let in-flight handlers finish and flush their
    /// responses, then wait for every connection to end.
    pub async fn close(&self) {
        self.state.shutdown.cancel();
        let serve = self.serve.lock().await.take();
        if let Some(serve) = serve {
            if let Err(e) = serve.await {
                error!(interface = %self.kind(), "Accept loop panicked: {}", e);
            }
        }
        self.state.tracker.close();
        self.state.tracker.wait().await;
        info!("{} interface closed", self.kind());
    }
}

impl Drop for InterfaceServer {
    fn drop(&mut self) {
        self.state.shutdown.cancel();
    }
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<InterfaceState>>,
) -> impl IntoResponse {
    let tracker = state.tracker.clone();
    ws.on_upgrade(move |socket| tracker.track_future(handle_connection(socket, state)))
}
