//! WebSocket connection handling
//!
//! Frames on one connection are handled strictly one after another, so
//! responses leave in request order. Each handler runs in a task on the
//! interface's tracker: a client that hangs up mid-call does not cancel it,
//! and `close()` still waits for it.

use crate::interface::InterfaceState;
use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures::{SinkExt, StreamExt};
use mockconductor_core::{Error, Result, RpcRequest, RpcResponse};
use serde::Deserialize;
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// A response plus the fault that should take the interface down after it
/// has been sent.
struct Outcome {
    response: RpcResponse,
    fatal: Option<Error>,
}

impl Outcome {
    fn reply(response: RpcResponse) -> Self {
        Self {
            response,
            fatal: None,
        }
    }
}

pub(crate) async fn handle_connection(socket: WebSocket, state: Arc<InterfaceState>) {
    let conn_id = Uuid::new_v4();
    let span = info_span!("connection", interface = %state.kind, %conn_id);
    connection_loop(socket, state).instrument(span).await
}

async fn connection_loop(socket: WebSocket, state: Arc<InterfaceState>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    info!("Client connected");

    loop {
        let msg = tokio::select! {
            biased;
            _ = state.shutdown.cancelled() => {
                let _ = ws_tx.send(WsMessage::Close(None)).await;
                debug!("Interface shutting down, closing connection");
                return;
            }
            msg = ws_rx.next() => msg,
        };

        let outcome = match msg {
            Some(Ok(WsMessage::Text(text))) => handle_text_message(&text, &state).await,
            Some(Ok(WsMessage::Binary(_))) => {
                Outcome::reply(RpcResponse::parse_error("binary frames are not supported"))
            }
            Some(Ok(WsMessage::Close(_))) => {
                info!("Client disconnected");
                return;
            }
            Some(Err(e)) => {
                warn!("WebSocket error: {}", e);
                return;
            }
            None => return, // Stream ended
            _ => continue,  // Ping, Pong
        };

        let delivered = match serde_json::to_string(&outcome.response) {
            Ok(json) => ws_tx.send(WsMessage::Text(json)).await.is_ok(),
            Err(e) => {
                error!("Failed to encode response: {}", e);
                false
            }
        };

        if let Some(fault) = outcome.fatal {
            state.raise_fatal(&fault);
            let _ = ws_tx.send(WsMessage::Close(None)).await;
            return;
        }
        if !delivered {
            warn!("Client gone, response undeliverable");
            return;
        }
    }
}

/// Decode one frame and run it. Always produces exactly one response.
async fn handle_text_message(text: &str, state: &Arc<InterfaceState>) -> Outcome {
    let frame = match serde_json::from_str::<Value>(text) {
        Ok(frame) => frame,
        Err(e) => {
            let preview: String = text.chars().take(100).collect();
            warn!("Unparseable frame: {}", preview);
            return Outcome::reply(RpcResponse::parse_error(e.to_string()));
        }
    };
    let req = match RpcRequest::deserialize(&frame) {
        Ok(req) => req,
        Err(e) => {
            warn!("Frame is not a request: {}", e);
            let id = frame.get("id").cloned().unwrap_or(Value::Null);
            return Outcome::reply(RpcResponse::invalid_request(id, e.to_string()));
        }
    };

    let id = req.id.clone();
    match dispatch(req, state).await {
        Ok(result) => Outcome::reply(RpcResponse::ok(id, result)),
        Err(err) if err.is_fatal() => {
            error!(kind = err.kind(), "Handler fault: {}", err);
            Outcome {
                response: RpcResponse::from_error(id, &err),
                fatal: Some(err),
            }
        }
        Err(err) => {
            warn!(kind = err.kind(), "Call failed: {}", err);
            Outcome::reply(RpcResponse::from_error(id, &err))
        }
    }
}

async fn dispatch(req: RpcRequest, state: &Arc<InterfaceState>) -> Result<Value> {
    let frame = req.frame()?;
    let handler = state.registry.resolve(&frame.path)?;
    debug!(path = %frame.path, "Dispatching call");

    let args = frame.primary_arg();
    let task = state
        .tracker
        .spawn(async move { handler.call(args).await }.in_current_span());
    match task.await {
        Ok(result) => result,
        Err(join) if join.is_panic() => Err(Error::internal(format!(
            "handler '{}' panicked: {}",
            frame.path,
            panic_message(join.into_panic())
        ))),
        Err(join) => Err(Error::internal(format!(
            "handler '{}' did not complete: {}",
            frame.path, join
        ))),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
