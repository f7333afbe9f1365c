//! WebSocket handler: the live display surface.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS
//! - Push the current view on connect and every published view afterwards
//! - Decode-once inbound envelopes and hand them to the dispatcher
//! - Lifecycle: ping + idle timeout, frame size limit

use std::sync::atomic::{AtomicU64, Ordering};

use axum::{
    extract::{ws::Message, ws::WebSocket, ws::WebSocketUpgrade, State},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tracing::Instrument;

use signalwatch_core::error::{Result, SignalWatchError};

use crate::app_state::AppState;
use crate::session::SessionCtx;
use crate::transport::codec::{decode, frame_len, Inbound};
use crate::transport::outbound::{snapshot_json, sys_error_json, sys_ready_json};

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

const OUTBOUND_QUEUE: usize = 64;

// --------------------
// Entry
// --------------------
pub async fn ws_upgrade(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    app.metrics().ws_upgrades.inc(&[]);
    let session_id = format!("s{}", NEXT_SESSION.fetch_add(1, Ordering::Relaxed));
    let span = tracing::info_span!("ws_session", session = %session_id);

    ws.on_upgrade(move |socket| {
        async move {
            app.metrics().ws_active_sessions.inc(&[]);
            tracing::info!("session opened");
            if let Err(e) = run_session(&app, session_id, socket).await {
                tracing::warn!(error = %e, "session ended with error");
            }
            app.metrics().ws_active_sessions.dec(&[]);
            tracing::info!("session closed");
        }
        .instrument(span)
    })
}

// --------------------
// Core session loop
// --------------------
async fn run_session(app: &AppState, session_id: String, socket: WebSocket) -> Result<()> {
    let controller = app.controller();
    let gw = &app.cfg().gateway;

    let (out_tx, mut out_rx) = mpsc::channel::<Message>(OUTBOUND_QUEUE);
    let (mut ws_tx, mut ws_rx) = socket.split();

    let mut views = controller.subscribe();
    let ready = sys_ready_json(&session_id, controller.junctions().len());
    let first = snapshot_json(&views.borrow_and_update());
    for text in [ready, first] {
        ws_tx
            .send(Message::Text(text))
            .await
            .map_err(|e| SignalWatchError::Internal(format!("ws send failed: {e}")))?;
    }

    let ctx = SessionCtx::new(session_id, controller, out_tx.clone());

    let mut ping_tick = tokio::time::interval(Duration::from_millis(gw.ping_interval_ms));
    ping_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let idle_timeout = Duration::from_millis(gw.idle_timeout_ms);
    let mut idle_check = tokio::time::interval(Duration::from_millis(250));
    let mut last_activity = Instant::now();

    loop {
        tokio::select! {
            // outbound writer (service replies)
            maybe_out = out_rx.recv() => {
                let Some(m) = maybe_out else { break; };
                if ws_tx.send(m).await.is_err() {
                    break;
                }
            }

            // published views
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let text = snapshot_json(&views.borrow_and_update());
                if ws_tx.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }

            // inbound reader
            incoming = ws_rx.next() => {
                let Some(Ok(msg)) = incoming else { break; };
                last_activity = Instant::now();

                // size check before any parsing
                if frame_len(&msg) > gw.max_frame_bytes {
                    let _ = ws_tx.send(Message::Text(sys_error_json("BAD_REQUEST", "frame too large"))).await;
                    break;
                }

                match decode(msg) {
                    Ok(Inbound::Text { env, bytes_len }) => {
                        let svc = env.svc.clone();
                        let msg_type = env.msg_type.clone();
                        tracing::debug!(%svc, %msg_type, bytes_len, "inbound envelope");
                        if let Err(e) = app.dispatcher().dispatch_text(ctx.clone(), env).await {
                            app.metrics().service_errors.inc(&[("svc", svc.as_str())]);
                            let code = e.client_code().as_str();
                            let _ = out_tx.send(Message::Text(sys_error_json(code, &e.to_string()))).await;
                        }
                    }
                    Ok(Inbound::Binary { .. }) => {
                        app.metrics().decode_errors.inc(&[("kind", "binary")]);
                        let _ = out_tx.send(Message::Text(sys_error_json("BAD_REQUEST", "binary frames are not supported"))).await;
                    }
                    Ok(Inbound::Ping(payload)) => {
                        let _ = out_tx.send(Message::Pong(payload)).await;
                    }
                    Ok(Inbound::Pong) => {}
                    Ok(Inbound::Close) => break,
                    Err(e) => {
                        app.metrics().decode_errors.inc(&[("kind", "text")]);
                        let code = e.client_code().as_str();
                        let _ = out_tx.send(Message::Text(sys_error_json(code, &e.to_string()))).await;
                    }
                }
            }

            // ping
            _ = ping_tick.tick() => {
                let _ = out_tx.send(Message::Ping(Vec::new())).await;
            }

            // idle timeout
            _ = idle_check.tick() => {
                if last_activity.elapsed() >= idle_timeout {
                    let _ = ws_tx.send(Message::Text(sys_error_json("TIMEOUT", "idle timeout"))).await;
                    break;
                }
            }
        }
    }

    Ok(())
}
