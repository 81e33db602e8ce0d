//! WebSocket gateway against an in-process server.

mod support;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_test::assert_ok;
use tokio_tungstenite::tungstenite::Message;

use gatewire::app::run_streamer;
use gatewire::dispatcher::Dispatcher;
use gatewire::domain::Credentials;
use gatewire::error::Error;
use gatewire::gateway::ws::WsConnector;
use gatewire::gateway::GatewayEvent;
use gatewire::testkit::domain::es_key;

use support::{lines, stop_after};

/// Replies the fake gateway sends for one request.
fn replies(request: &Value, accept_login: bool) -> Vec<Value> {
    let id = request["id"].as_u64();
    match request["type"].as_str() {
        Some("login") if accept_login => vec![json!({"type": "login_status", "success": true})],
        Some("login") => vec![json!({
            "type": "login_status",
            "success": false,
            "message": "account locked",
        })],
        Some("lookup") => vec![
            json!({"type": "lookup", "id": id, "final": false, "error": "searching"}),
            json!({"type": "lookup", "id": id, "final": true, "instrument": {"id": "ES-2013-03"}}),
        ],
        Some("subscribe_trades") => vec![
            // Nobody subscribed to id 99.
            json!({"type": "trades", "id": 99, "ticks": [{"price": "1.00", "quantity": 1}]}),
            json!({"type": "heartbeat"}),
            json!({"type": "trades", "id": id, "ticks": [{"price": "1475.25", "quantity": 3}]}),
        ],
        _ => Vec::new(),
    }
}

/// Serve one client; returns the request types it received, in order.
async fn spawn_gateway(accept_login: bool) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let mut seen = Vec::new();
        while let Some(Ok(frame)) = ws.next().await {
            let text = match frame {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };
            let request: Value = serde_json::from_str(&text).unwrap();
            seen.push(request["type"].as_str().unwrap_or_default().to_string());
            for reply in replies(&request, accept_login) {
                if ws.send(Message::Text(reply.to_string())).await.is_err() {
                    return seen;
                }
            }
        }
        seen
    });

    (url, server)
}

#[tokio::test]
async fn streams_trades_and_unsubscribes_on_shutdown() {
    let (url, server) = spawn_gateway(true).await;
    let dispatcher: Dispatcher<GatewayEvent> = Dispatcher::new();
    stop_after(dispatcher.handle(), 300);
    let mut out = Vec::new();

    let result = run_streamer(
        dispatcher,
        Box::new(WsConnector::new(url)),
        Credentials::new("trader", "secret"),
        es_key(),
        &mut out,
    )
    .await;

    assert_ok!(result);
    assert_eq!(lines(&out), vec!["Found: ES Mar13", "LTP = 1475.25 : LTQ = 3"]);
    let seen = server.await.unwrap();
    assert_eq!(
        seen,
        vec![
            "login",
            "lookup",
            "subscribe_trades",
            "unsubscribe",
            "unsubscribe",
            "logout",
        ]
    );
}

#[tokio::test]
async fn rejected_login_logs_out() {
    let (url, server) = spawn_gateway(false).await;
    let mut out = Vec::new();

    let result = run_streamer(
        Dispatcher::new(),
        Box::new(WsConnector::new(url)),
        Credentials::new("trader", "secret"),
        es_key(),
        &mut out,
    )
    .await;

    assert!(matches!(result, Err(Error::Auth(ref m)) if m == "account locked"));
    assert_eq!(lines(&out), vec!["Login failed: account locked"]);
    assert_eq!(server.await.unwrap(), vec!["login", "logout"]);
}

#[tokio::test]
async fn unreachable_gateway_fails_initialization() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    drop(listener);
    let mut out = Vec::new();

    let result = run_streamer(
        Dispatcher::new(),
        Box::new(WsConnector::new(url)),
        Credentials::new("trader", "secret"),
        es_key(),
        &mut out,
    )
    .await;

    assert!(matches!(result, Err(Error::Init(_))));
    let out = lines(&out);
    assert_eq!(out.len(), 1);
    assert!(out[0].starts_with("Gateway initialization failed: "));
}
