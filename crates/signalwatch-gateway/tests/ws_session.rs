//! WebSocket sessions over a real socket: greeting, pushes, inbound errors, limits.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use signalwatch_core::generator::FixedClock;
use signalwatch_gateway::app_state::AppState;
use signalwatch_gateway::config;
use signalwatch_gateway::controller::RefreshTrigger;
use signalwatch_gateway::router;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

fn state() -> AppState {
    let cfg = config::load_from_str("version: 1\nrefresh:\n  auto_start: false\n  seed: 11\n").unwrap();
    let now = NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(17, 30, 0)
        .unwrap();
    AppState::with_clock(cfg, Arc::new(FixedClock(now))).unwrap()
}

async fn serve(state: AppState) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router::build_router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Connect and consume the greeting: `sys.ready` then the current snapshot.
async fn connect(addr: SocketAddr) -> (Client, Value) {
    let (mut ws, _) = connect_async(format!("ws://{addr}/v1/ws")).await.unwrap();

    let ready = next_json(&mut ws).await;
    assert_eq!(ready["svc"], "sys");
    assert_eq!(ready["type"], "ready");
    assert_eq!(ready["data"]["junctions"], 5);
    assert!(ready["data"]["session"].as_str().unwrap().starts_with('s'));

    let first = next_json(&mut ws).await;
    assert_eq!(first["svc"], "traffic");
    assert_eq!(first["type"], "snapshot");
    (ws, first)
}

/// Next non-control frame; `None` once the server has gone away.
async fn next_frame(ws: &mut Client) -> Option<Message> {
    loop {
        match timeout(WAIT, ws.next()).await.expect("timed out waiting for a frame") {
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
            Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return None,
            Some(Ok(m)) => return Some(m),
        }
    }
}

async fn next_json(ws: &mut Client) -> Value {
    match next_frame(ws).await {
        Some(Message::Text(s)) => serde_json::from_str(&s).unwrap(),
        other => panic!("expected text frame, got {other:?}"),
    }
}

async fn send_text(ws: &mut Client, text: impl Into<String>) {
    ws.send(Message::Text(text.into())).await.unwrap();
}

async fn http_post(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let req = format!("POST {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
    stream.write_all(req.as_bytes()).await.unwrap();
    let mut buf = String::new();
    timeout(WAIT, stream.read_to_string(&mut buf)).await.unwrap().unwrap();
    buf
}

#[tokio::test]
async fn greeting_is_ready_then_current_snapshot() {
    let st = state();
    let addr = serve(st.clone()).await;
    let (_ws, first) = connect(addr).await;

    assert_eq!(first["data"]["seq"], 1);
    assert_eq!(first["data"]["autoRefresh"], false);
    assert_eq!(first["data"]["snapshot"]["lastUpdate"], "17:30:00");
    assert_eq!(first["data"]["snapshot"]["junctions"].as_array().unwrap().len(), 5);
    assert_eq!(st.metrics().ws_upgrades.get(&[]), 1);
    assert_eq!(st.metrics().ws_active_sessions.get(&[]), 1);
}

#[tokio::test]
async fn every_published_view_is_pushed() {
    let st = state();
    let addr = serve(st.clone()).await;
    let (mut ws, _) = connect(addr).await;

    let view = st.controller().refresh(RefreshTrigger::Manual);
    let pushed = next_json(&mut ws).await;
    assert_eq!(pushed["type"], "snapshot");
    assert_eq!(pushed["data"]["seq"], view.seq);

    let reply = http_post(addr, "/api/refresh").await;
    assert!(reply.starts_with("HTTP/1.1 200"), "{reply}");
    let pushed = next_json(&mut ws).await;
    assert_eq!(pushed["type"], "snapshot");
    assert_eq!(pushed["data"]["seq"], 3);

    let reply = http_post(addr, "/api/auto-refresh/toggle").await;
    assert!(reply.starts_with("HTTP/1.1 200"), "{reply}");
    let pushed = next_json(&mut ws).await;
    assert_eq!(pushed["data"]["autoRefresh"], true);
    assert_eq!(pushed["data"]["seq"], 3);
}

#[tokio::test]
async fn refresh_request_gets_ack_and_push() {
    let st = state();
    let addr = serve(st).await;
    let (mut ws, _) = connect(addr).await;

    send_text(&mut ws, r#"{"v":1,"svc":"traffic","type":"refresh","seq":7}"#).await;

    // the push and the ack travel on separate queues, so either may come first
    let mut got_ack = false;
    let mut got_push = false;
    while !(got_ack && got_push) {
        let msg = next_json(&mut ws).await;
        match msg["type"].as_str().unwrap() {
            "ack" => {
                assert_eq!(msg["data"]["seq"], 7);
                assert_eq!(msg["data"]["viewSeq"], 2);
                got_ack = true;
            }
            "snapshot" => {
                assert_eq!(msg["data"]["seq"], 2);
                got_push = true;
            }
            other => panic!("unexpected frame type {other}"),
        }
    }
}

#[tokio::test]
async fn binary_frame_is_refused_and_session_continues() {
    let st = state();
    let addr = serve(st.clone()).await;
    let (mut ws, _) = connect(addr).await;

    ws.send(Message::Binary(vec![1, 2, 3])).await.unwrap();
    let err = next_json(&mut ws).await;
    assert_eq!(err["svc"], "sys");
    assert_eq!(err["type"], "error");
    assert_eq!(err["data"]["code"], "BAD_REQUEST");
    assert_eq!(err["data"]["msg"], "binary frames are not supported");
    assert_eq!(st.metrics().decode_errors.get(&[("kind", "binary")]), 1);

    send_text(&mut ws, r#"{"v":1,"svc":"traffic","type":"get"}"#).await;
    let snap = next_json(&mut ws).await;
    assert_eq!(snap["type"], "snapshot");
    assert_eq!(snap["data"]["seq"], 1);
}

#[tokio::test]
async fn malformed_envelope_is_reported_and_session_continues() {
    let st = state();
    let addr = serve(st.clone()).await;
    let (mut ws, _) = connect(addr).await;

    send_text(&mut ws, "{not json").await;
    let err = next_json(&mut ws).await;
    assert_eq!(err["type"], "error");
    assert_eq!(err["data"]["code"], "BAD_REQUEST");

    send_text(&mut ws, r#"{"v":2,"svc":"traffic","type":"get"}"#).await;
    let err = next_json(&mut ws).await;
    assert_eq!(err["data"]["code"], "UNSUPPORTED_VERSION");

    send_text(&mut ws, r#"{"v":1,"svc":"traffic","type":"nope"}"#).await;
    let err = next_json(&mut ws).await;
    assert_eq!(err["data"]["code"], "BAD_REQUEST");
    assert_eq!(st.metrics().service_errors.get(&[("svc", "traffic")]), 1);
    assert_eq!(st.metrics().decode_errors.get(&[("kind", "text")]), 2);

    send_text(&mut ws, r#"{"v":1,"svc":"traffic","type":"signals"}"#).await;
    let signals = next_json(&mut ws).await;
    assert_eq!(signals["type"], "signals");
    assert_eq!(signals["data"]["plans"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn oversized_frame_closes_the_session() {
    let st = state();
    let addr = serve(st.clone()).await;
    let (mut ws, _) = connect(addr).await;

    let limit = st.cfg().gateway.max_frame_bytes;
    send_text(&mut ws, "x".repeat(limit + 1)).await;

    let err = next_json(&mut ws).await;
    assert_eq!(err["data"]["code"], "BAD_REQUEST");
    assert_eq!(err["data"]["msg"], "frame too large");
    assert!(next_frame(&mut ws).await.is_none());

    // the gauge drops once the session task has finished
    timeout(WAIT, async {
        while st.metrics().ws_active_sessions.get(&[]) != 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("session still counted as active");
}

#[tokio::test]
async fn frame_at_the_limit_is_accepted() {
    let st = state();
    let addr = serve(st.clone()).await;
    let (mut ws, _) = connect(addr).await;

    let base = r#"{"v":1,"svc":"traffic","type":"get","seq":1}"#;
    let limit = st.cfg().gateway.max_frame_bytes;
    let padded = format!("{base}{}", " ".repeat(limit - base.len()));
    assert_eq!(padded.len(), limit);

    send_text(&mut ws, padded).await;
    let snap = next_json(&mut ws).await;
    assert_eq!(snap["type"], "snapshot");
}
