//! HTTP handlers and the `traffic` WebSocket service, driven without a socket.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use axum::extract::ws::Message;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use serde_json::Value;
use tokio::sync::mpsc;

use signalwatch_core::generator::FixedClock;
use signalwatch_core::protocol::text::Envelope;
use signalwatch_gateway::api::{self, SetAutoRefresh};
use signalwatch_gateway::app_state::AppState;
use signalwatch_gateway::config;
use signalwatch_gateway::session::SessionCtx;

fn state(auto_start: bool) -> AppState {
    let yaml = format!("version: 1\nrefresh:\n  auto_start: {auto_start}\n  seed: 5\n");
    let cfg = config::load_from_str(&yaml).unwrap();
    let now = NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    AppState::with_clock(cfg, Arc::new(FixedClock(now))).unwrap()
}

fn text(msg: Message) -> Value {
    match msg {
        Message::Text(s) => serde_json::from_str(&s).unwrap(),
        other => panic!("expected text, got {other:?}"),
    }
}

#[tokio::test]
async fn auto_refresh_starts_from_config() {
    let st = state(true);
    let Json(status) = api::get_auto_refresh(State(st.clone())).await;
    assert!(status.enabled);
    assert_eq!(status.interval_ms, 10_000);

    let st = state(false);
    let Json(status) = api::get_auto_refresh(State(st)).await;
    assert!(!status.enabled);
}

#[tokio::test]
async fn refresh_endpoint_bumps_seq_without_enabling_timer() {
    let st = state(false);
    let Json(before) = api::snapshot(State(st.clone())).await;
    let Json(after) = api::refresh(State(st.clone())).await;

    assert_eq!(after.seq, before.seq + 1);
    assert!(!after.auto_refresh);
    assert_eq!(st.metrics().refreshes.get(&[("trigger", "manual")]), 1);
}

#[tokio::test]
async fn toggle_and_set_endpoints() {
    let st = state(true);
    let Json(s) = api::toggle_auto_refresh(State(st.clone())).await.unwrap();
    assert!(!s.enabled);

    let Json(s) = api::set_auto_refresh(State(st.clone()), Json(SetAutoRefresh { enabled: true }))
        .await
        .unwrap();
    assert!(s.enabled);
    assert!(st.controller().auto_refresh());
}

#[tokio::test]
async fn enabling_while_draining_is_refused() {
    let st = state(true);
    st.begin_drain();
    assert!(st.is_draining());
    assert!(!st.controller().auto_refresh());

    let err = api::set_auto_refresh(State(st.clone()), Json(SetAutoRefresh { enabled: true }))
        .await
        .expect_err("must refuse");
    assert_eq!(err.into_response().status(), StatusCode::CONFLICT);

    let err = api::toggle_auto_refresh(State(st.clone())).await.expect_err("must refuse");
    assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    assert!(!st.controller().auto_refresh());

    // disabling and manual refresh still work
    api::set_auto_refresh(State(st.clone()), Json(SetAutoRefresh { enabled: false }))
        .await
        .unwrap();
    let Json(view) = api::refresh(State(st.clone())).await;
    assert_eq!(view.seq, 2);

    let resp = signalwatch_gateway::ops::readyz(State(st)).await.into_response();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn websocket_cannot_reenable_auto_refresh_while_draining() {
    let st = state(true);
    let (tx, mut rx) = mpsc::channel(8);
    let ctx = SessionCtx::new("s-drain", st.controller(), tx);
    st.begin_drain();

    for raw in [
        r#"{"v":1,"svc":"traffic","type":"set_auto","data":{"enabled":true}}"#,
        r#"{"v":1,"svc":"traffic","type":"toggle_auto"}"#,
    ] {
        let env = Envelope::parse(raw).unwrap();
        let err = st.dispatcher().dispatch_text(ctx.clone(), env).await.expect_err("must refuse");
        assert_eq!(err.client_code().as_str(), "NOT_ALLOWED");
        assert!(!st.controller().auto_refresh());
    }
    assert!(rx.try_recv().is_err());
    assert!(!st.controller().current().auto_refresh);
}

#[tokio::test]
async fn junctions_and_signals_endpoints() {
    let st = state(false);
    let Json(j) = api::junctions(State(st.clone())).await;
    assert_eq!(j.network_stats.total_junctions, 5);
    assert_eq!(j.network_stats.total_roads, 5);
    assert_eq!(j.network_stats.average_capacity, 60);
    assert_eq!(j.junctions[4].id, "J005");
    assert!((j.network_stats.mean_base_congestion - 0.5).abs() < 1e-9);
    let r004 = &j.road_network[3];
    assert_eq!((r004.source.as_str(), r004.target.as_str(), r004.lanes), ("J004", "J005", 4));

    let Json(sig) = api::signals(State(st.clone())).await;
    assert_eq!(sig.plans.len(), 5);
    assert_eq!(sig.snapshot_seq, 1);
    assert_eq!(sig.last_update, "12:00:00");

    let m = &sig.network_metrics;
    assert_eq!(m.total_signals_optimized, 5);
    let view = st.controller().current();
    let mean = view.snapshot.junctions.iter().map(|r| f64::from(r.congestion_pct)).sum::<f64>() / 500.0;
    assert!((m.average_congestion - mean).abs() < 1e-3);
    let efficiency: f64 = m.network_efficiency.trim_end_matches('%').parse().unwrap();
    assert!((efficiency - (1.0 - mean) * 100.0).abs() <= 0.051);
    for plan in &sig.plans {
        assert!((0.7..=0.95).contains(&plan.optimization_score));
    }
}

#[tokio::test]
async fn junctions_json_shape() {
    let st = state(false);
    let Json(j) = api::junctions(State(st)).await;
    let v = serde_json::to_value(&j).unwrap();
    assert_eq!(v["networkStats"]["totalRoads"], 5);
    assert_eq!(v["roadNetwork"][0]["id"], "R001");
    assert_eq!(v["roadNetwork"][2]["type"], "collector");
    assert_eq!(v["roadNetwork"][4]["length_km"], 1.5);
}

#[tokio::test]
async fn snapshot_json_shape() {
    let st = state(false);
    let Json(view) = api::snapshot(State(st)).await;
    let v = serde_json::to_value(&view).unwrap();

    assert_eq!(v["seq"], 1);
    assert_eq!(v["autoRefresh"], false);
    let snap = &v["snapshot"];
    assert!(snap["totalVehicles"].is_u64());
    assert!(snap["avgCongestion"].is_u64());
    assert_eq!(snap["junctions"].as_array().unwrap().len(), 5);
    let first = &snap["junctions"][0];
    assert_eq!(first["junctionId"], "J001");
    assert_eq!(first["lastUpdate"], "12:00");
    let signal = first["signal"].as_str().unwrap();
    assert!(["GREEN", "YELLOW", "RED"].contains(&signal));
}

#[tokio::test]
async fn traffic_service_handles_actions() {
    let st = state(false);
    let (tx, mut rx) = mpsc::channel(8);
    let ctx = SessionCtx::new("s-test", st.controller(), tx);

    let env = Envelope::parse(r#"{"v":1,"svc":"traffic","type":"refresh","seq":1}"#).unwrap();
    st.dispatcher().dispatch_text(ctx.clone(), env).await.unwrap();
    let ack = text(rx.recv().await.unwrap());
    assert_eq!(ack["type"], "ack");
    assert_eq!(ack["data"]["action"], "refresh");
    assert_eq!(ack["data"]["seq"], 1);
    assert_eq!(ack["data"]["viewSeq"], 2);
    assert_eq!(ack["data"]["autoRefresh"], false);

    let env = Envelope::parse(r#"{"v":1,"svc":"traffic","type":"set_auto","data":{"enabled":true}}"#).unwrap();
    st.dispatcher().dispatch_text(ctx.clone(), env).await.unwrap();
    let ack = text(rx.recv().await.unwrap());
    assert_eq!(ack["data"]["autoRefresh"], true);

    let env = Envelope::parse(r#"{"v":1,"svc":"traffic","type":"toggle_auto"}"#).unwrap();
    st.dispatcher().dispatch_text(ctx.clone(), env).await.unwrap();
    let ack = text(rx.recv().await.unwrap());
    assert_eq!(ack["data"]["autoRefresh"], false);

    let env = Envelope::parse(r#"{"v":1,"svc":"traffic","type":"signals"}"#).unwrap();
    st.dispatcher().dispatch_text(ctx.clone(), env).await.unwrap();
    let signals = text(rx.recv().await.unwrap());
    assert_eq!(signals["data"]["plans"].as_array().unwrap().len(), 5);
    assert_eq!(signals["data"]["networkMetrics"]["totalSignalsOptimized"], 5);
    assert!(signals["data"]["plans"][0]["predictedCongestion"].is_f64());

    let env = Envelope::parse(r#"{"v":1,"svc":"traffic","type":"get"}"#).unwrap();
    st.dispatcher().dispatch_text(ctx, env).await.unwrap();
    let snap = text(rx.recv().await.unwrap());
    assert_eq!(snap["type"], "snapshot");
    assert_eq!(snap["data"]["seq"], 2);
}

#[tokio::test]
async fn unknown_service_and_type_are_bad_requests() {
    let st = state(false);
    let (tx, _rx) = mpsc::channel(8);
    let ctx = SessionCtx::new("s-test", st.controller(), tx);

    let env = Envelope::parse(r#"{"v":1,"svc":"chat","type":"send"}"#).unwrap();
    let err = st.dispatcher().dispatch_text(ctx.clone(), env).await.unwrap_err();
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");

    let env = Envelope::parse(r#"{"v":1,"svc":"traffic","type":"explode"}"#).unwrap();
    let err = st.dispatcher().dispatch_text(ctx, env).await.unwrap_err();
    assert!(err.to_string().contains("unknown traffic type"));
}

#[tokio::test]
async fn metrics_body_lists_live_gauges() {
    let st = state(false);
    let resp = signalwatch_gateway::ops::metrics(State(st)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = String::from_utf8(body.to_vec()).unwrap();
    assert!(body.contains("signalwatch_refreshes_total{trigger=\"initial\"} 1"));
    assert!(body.contains("signalwatch_snapshot_seq 1"));
    assert!(body.contains("signalwatch_auto_refresh_enabled 0"));
}

#[tokio::test]
async fn dashboard_page_sets_junction_text_without_markup() {
    let axum::response::Html(page) = api::index().await;
    assert!(page.contains("/v1/ws"));
    assert!(!page.contains("innerHTML"));
    assert!(page.contains("el.textContent = text"));
}
