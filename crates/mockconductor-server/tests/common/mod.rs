//! WebSocket client helpers shared by the server integration tests

#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use mockconductor_core::{RpcRequest, RpcResponse};
use serde_json::Value;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub async fn connect(url: &str) -> Client {
    let (ws, _) = connect_async(url).await.expect("connect");
    ws
}

pub async fn send(ws: &mut Client, id: u64, method: &str, params: Value) {
    let frame = serde_json::to_string(&RpcRequest::new(id, method, params)).unwrap();
    ws.send(Message::Text(frame)).await.unwrap();
}

pub async fn recv(ws: &mut Client) -> RpcResponse {
    let next = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).unwrap(),
                Some(Ok(_)) => continue,
                other => panic!("connection ended while waiting for a response: {other:?}"),
            }
        }
    });
    next.await.expect("response within 5s")
}

pub async fn call(ws: &mut Client, id: u64, method: &str, params: Value) -> RpcResponse {
    send(ws, id, method, params).await;
    recv(ws).await
}
