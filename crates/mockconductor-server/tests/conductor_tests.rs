//! End-to-end tests against a running mock conductor

mod common;

use axum::{http::StatusCode, routing::post, Router};
use common::{call, connect};
use mockconductor_core::signature::{agent_id_of, generate_keypair, sign};
use mockconductor_core::{
    address, address_of, zome_ok, ConductorConfig, InterfaceKind, InterfacePorts,
    WormholeConfig,
};
use mockconductor_handlers::{handler_fn, HandlerRef};
use mockconductor_server::Conductor;
use serde_json::{json, Value};
use std::time::Duration;

fn config() -> ConductorConfig {
    ConductorConfig {
        host: "127.0.0.1".to_string(),
        interfaces: InterfacePorts::ephemeral(),
        wormhole: WormholeConfig {
            // Reserved port; nothing listens there.
            url: "http://127.0.0.1:9/".to_string(),
            timeout_ms: 200,
        },
    }
}

async fn start() -> Conductor {
    Conductor::start(&config()).await.unwrap()
}

#[tokio::test]
async fn admin_add_then_list() -> anyhow::Result<()> {
    let conductor = start().await;
    let mut ws = connect(&conductor.admin().url()).await;

    let added = call(
        &mut ws,
        1,
        "admin/agent/add",
        json!({
            "id": "host-agent",
            "name": "Host Agent",
            "holo_remote_key": "uhCAkfXCJ7tqEmNaKfGCbSQrrnT3P1VnW0vaSDhoZAXYHTeaIpaVB",
        }),
    )
    .await;
    assert_eq!(added.result, Some(json!({ "success": true })));

    // Positional form, as older clients send it.
    let added = call(&mut ws, 2, "admin/agent/add", json!([{ "id": "second" }])).await;
    assert_eq!(added.result, Some(json!({ "success": true })));

    let listed = call(&mut ws, 3, "admin/agent/list", json!({})).await;
    let agents = listed.result.unwrap();
    assert_eq!(agents.as_array().map(Vec::len), Some(2));
    assert_eq!(
        agents[0],
        json!({
            "id": "host-agent",
            "name": "Host Agent",
            "public_address": "uhCAkfXCJ7tqEmNaKfGCbSQrrnT3P1VnW0vaSDhoZAXYHTeaIpaVB",
            "keystore_file": "::ignored::",
            "holo_remote_key": true,
            "test_agent": null,
        })
    );
    assert_eq!(agents[1]["id"], "second");
    assert_eq!(conductor.agents().list_agents().await.len(), 2);

    for method in ["admin/instance/add", "admin/instance/start", "admin/interface/add_instance"] {
        let resp = call(&mut ws, 4, method, json!({ "id": "x" })).await;
        assert_eq!(resp.result, Some(json!({ "success": true })), "{method}");
    }

    conductor.stop().await;
    Ok(())
}

#[tokio::test]
async fn admin_add_without_id_reports_failure() {
    let conductor = start().await;
    let mut ws = connect(&conductor.admin().url()).await;

    let resp = call(&mut ws, 1, "admin/agent/add", json!({ "name": "nobody" })).await;
    assert_eq!(resp.result, Some(json!({ "success": false })));
    assert!(conductor.agents().list_agents().await.is_empty());
}

fn signed_request(timestamp: &str) -> anyhow::Result<Value> {
    let client = generate_keypair()?;
    let host = generate_keypair()?;
    let request = json!({
        "timestamp": timestamp,
        "host_id": agent_id_of(&host)?.as_str(),
        "call_spec": {
            "hha_hash": address(b"hha").as_str(),
            "dna_alias": "holofuel",
            "zome": "transactions",
            "function": "ledger_state",
            "args_hash": address_of(&json!({})).as_str(),
        },
    });
    Ok(json!({
        "agent_id": agent_id_of(&client)?.as_str(),
        "request_signature": sign(&client, &request),
        "request": request,
    }))
}

fn log_request(args: Value) -> Value {
    json!({ "instance_id": "servicelogger", "zome": "service", "function": "log_request", "args": args })
}

#[tokio::test]
async fn service_log_request_over_websocket() -> anyhow::Result<()> {
    let conductor = start().await;
    let mut ws = connect(&conductor.service().url()).await;
    let args = signed_request("2019-12-03T07:10:22+00:00")?;

    let ok = call(&mut ws, 1, "call", log_request(args.clone())).await;
    let commit = ok.result.unwrap();
    assert_eq!(commit["Ok"], json!(address_of(&args).as_str()));
    assert!(commit["Ok"].as_str().unwrap().starts_with("uhCEk"));

    let mut tampered = args.clone();
    tampered["request"]["host_id"] = args["agent_id"].clone();
    let bad = call(&mut ws, 2, "call", log_request(tampered)).await;
    assert_eq!(bad.error_kind(), Some("SignatureError"));
    assert_eq!(bad.error.unwrap().code, -32001);

    let late = call(&mut ws, 3, "call", log_request(signed_request("yesterday")?)).await;
    assert_eq!(late.error_kind(), Some("FormatError"));

    let unknown = call(
        &mut ws,
        4,
        "call",
        json!({ "zome": "service", "function": "log_everything", "args": {} }),
    )
    .await;
    assert_eq!(unknown.error_kind(), Some("RoutingError"));
    assert!(!conductor.service().is_closed());
    Ok(())
}

#[tokio::test]
async fn armed_fault_fails_one_log_request() -> anyhow::Result<()> {
    let conductor = start().await;
    let mut ws = connect(&conductor.service().url()).await;
    let args = signed_request("2019-12-03T07:10:22Z")?;

    conductor.fault().arm();
    let failed = call(&mut ws, 1, "call", log_request(args.clone())).await;
    assert_eq!(failed.error_kind(), Some("SerializationError"));
    assert!(failed
        .error
        .unwrap()
        .message
        .contains("Cannot decompress Edwards point at line 1 column 208"));

    let retried = call(&mut ws, 2, "call", log_request(args)).await;
    assert!(retried.is_ok());
    Ok(())
}

#[tokio::test]
async fn internal_call_reaches_installed_apps() {
    let conductor = start().await;
    let mut ws = connect(&conductor.internal().url()).await;

    let app = call(
        &mut ws,
        1,
        "call",
        json!({ "instance_id": "happ-store", "zome": "happs", "function": "get_app", "args": { "app_hash": "x" } }),
    )
    .await;
    assert_eq!(app.result.unwrap()["Ok"]["address"], "made_up_happ_store_hash");

    let details = call(
        &mut ws,
        2,
        "call",
        json!({ "instance_id": "holo-hosting-app", "zome": "provider", "function": "get_app_details", "args": {} }),
    )
    .await;
    assert_eq!(details.result.unwrap()["Ok"]["payment_pref"][0]["price_per_unit"], 1);

    let missing = call(
        &mut ws,
        3,
        "call",
        json!({ "instance_id": "holofuel", "zome": "transactions", "function": "ledger_state", "args": {} }),
    )
    .await;
    assert_eq!(missing.error_kind(), Some("RoutingError"));
}

#[tokio::test]
async fn general_interface_serves_runtime_handlers() {
    let conductor = start().await;
    assert!(conductor.general().registry().is_empty());

    conductor.general().register_once(
        "call",
        handler_fn(|spec: Value| async move { Ok(json!({ "Ok": spec["function"] })) }),
    );
    let mut ws = connect(&conductor.general().url()).await;

    let first = call(&mut ws, 1, "call", json!({ "zome": "z", "function": "whoami" })).await;
    assert_eq!(first.result, Some(json!({ "Ok": "whoami" })));
    let second = call(&mut ws, 2, "call", json!({ "zome": "z", "function": "whoami" })).await;
    assert_eq!(second.error_kind(), Some("RoutingError"));
}

#[tokio::test]
async fn fault_on_one_interface_leaves_others_running() {
    let conductor = start().await;
    conductor.general().register(
        "call",
        handler_fn(|_| async { Err(mockconductor_core::Error::internal("mock defect")) }),
    );

    let mut general = connect(&conductor.general().url()).await;
    let resp = call(&mut general, 1, "call", json!({})).await;
    assert_eq!(resp.error_kind(), Some("InternalFault"));

    let (kind, fault) = tokio::time::timeout(Duration::from_secs(2), conductor.fatal())
        .await
        .expect("fatal resolves");
    assert_eq!(kind, InterfaceKind::General);
    assert!(fault.to_string().contains("mock defect"));

    let mut admin = connect(&conductor.admin().url()).await;
    assert!(call(&mut admin, 1, "admin/agent/list", json!({})).await.is_ok());
    conductor.stop().await;
}

#[tokio::test]
async fn wormhole_failure_is_transport_error() {
    let conductor = start().await;
    let err = conductor
        .wormhole_request("uhCAkagent", &json!({ "some": "entry" }))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "TransportError");
}

/// A general `call` handler that needs a signature before it can answer.
fn signing_call(conductor: &Conductor) -> HandlerRef {
    let wormhole = conductor.wormhole().clone();
    handler_fn(move |spec: Value| {
        let wormhole = wormhole.clone();
        async move {
            let agent_id = spec["args"]["agent_id"].as_str().unwrap_or_default().to_string();
            let signature = wormhole
                .request_signature(&agent_id, &spec["args"]["entry"])
                .await?;
            Ok(zome_ok(json!(signature)))
        }
    })
}

fn signing_request() -> Value {
    json!({
        "zome": "transactions",
        "function": "promise",
        "args": { "agent_id": "uhCAkagent", "entry": { "amount": "1" } },
    })
}

#[tokio::test]
async fn unreachable_signer_fails_the_call_not_the_interface() {
    let conductor = start().await;
    conductor.general().register_once("call", signing_call(&conductor));
    let mut ws = connect(&conductor.general().url()).await;

    let resp = call(&mut ws, 1, "call", signing_request()).await;
    assert_eq!(resp.error_kind(), Some("TransportError"));
    assert_eq!(resp.error.unwrap().code, -32003);
    assert!(!conductor.general().is_closed());
}

#[tokio::test]
async fn refusing_signer_surfaces_service_error() {
    let signer = Router::new().route(
        "/",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "Agent is anonymous") }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let signer_addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, signer).await.unwrap() });

    let mut config = config();
    config.wormhole.url = format!("http://{}/", signer_addr);
    let conductor = Conductor::start(&config).await.unwrap();
    conductor.general().register_once("call", signing_call(&conductor));
    let mut ws = connect(&conductor.general().url()).await;

    let resp = call(&mut ws, 1, "call", signing_request()).await;
    assert_eq!(resp.error_kind(), Some("ServiceError"));
    let error = resp.error.unwrap();
    assert_eq!(error.code, -32004);
    assert_eq!(error.data.unwrap()["body"], "Agent is anonymous");
    assert!(!conductor.general().is_closed());

    // the interface keeps serving after the failed call
    conductor
        .general()
        .register("call", handler_fn(|_| async { Ok(zome_ok(json!("still here"))) }));
    let resp = call(&mut ws, 2, "call", json!({})).await;
    assert_eq!(resp.result, Some(json!({ "Ok": "still here" })));
}
