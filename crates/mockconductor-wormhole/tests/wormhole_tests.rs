//! Wormhole client against stub HTTP signers

use axum::{http::StatusCode, routing::post, Json, Router};
use mockconductor_core::{Error, WormholeConfig};
use mockconductor_wormhole::WormholeClient;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;

async fn spawn_signer(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client(addr: SocketAddr, timeout_ms: u64) -> WormholeClient {
    WormholeClient::new(&WormholeConfig {
        url: format!("http://{}/", addr),
        timeout_ms,
    })
    .unwrap()
}

#[tokio::test]
async fn ok_returns_body_as_signature() {
    let app = Router::new().route(
        "/",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["agent_id"], "uhCAkagent");
            assert_eq!(body["payload"], r#"{"a":1,"b":[true,null]}"#);
            "c2lnbmF0dXJl"
        }),
    );
    let addr = spawn_signer(app).await;

    let signature = client(addr, 1000)
        .request_signature("uhCAkagent", &json!({ "b": [true, null], "a": 1 }))
        .await
        .unwrap();
    assert_eq!(signature, "c2lnbmF0dXJl");
}

#[tokio::test]
async fn string_payload_is_sent_verbatim() {
    let app = Router::new().route(
        "/",
        post(|Json(body): Json<Value>| async move {
            body["payload"].as_str().unwrap_or_default().to_uppercase()
        }),
    );
    let addr = spawn_signer(app).await;

    let echoed = client(addr, 1000)
        .request_signature("uhCAkagent", &json!("{ not canonical }"))
        .await
        .unwrap();
    assert_eq!(echoed, "{ NOT CANONICAL }");
}

#[tokio::test]
async fn non_200_is_service_error_with_body() {
    let app = Router::new().route(
        "/",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "signer exploded") }),
    );
    let addr = spawn_signer(app).await;

    let err = client(addr, 1000)
        .request_signature("uhCAkagent", &json!({}))
        .await
        .unwrap_err();
    match err {
        Error::Service { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "signer exploded");
        }
        other => panic!("expected service error, got {other:?}"),
    }
}

#[tokio::test]
async fn hanging_signer_is_transport_error() {
    let app = Router::new().route(
        "/",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "too late"
        }),
    );
    let addr = spawn_signer(app).await;

    let started = std::time::Instant::now();
    let err = client(addr, 100)
        .request_signature("uhCAkagent", &json!({}))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "TransportError");
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn unreachable_signer_is_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let err = client(addr, 500)
        .request_signature("uhCAkagent", &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}
