//! Outbound frame builders.
//!
//! Every server-to-client frame is a JSON object with `v`, `svc`, `type`, and
//! an optional `data`; built with `serde_json::json!` so values are always
//! escaped correctly.

use serde::Serialize;
use serde_json::{json, Value};

use signalwatch_core::protocol::text::PROTOCOL_VERSION;

use crate::controller::DashboardView;

pub fn frame(svc: &str, msg_type: &str, data: Value) -> String {
    json!({
        "v": PROTOCOL_VERSION,
        "svc": svc,
        "type": msg_type,
        "data": data,
    })
    .to_string()
}

pub fn sys_ready_json(session_id: &str, junctions: usize) -> String {
    frame(
        "sys",
        "ready",
        json!({ "session": session_id, "junctions": junctions }),
    )
}

pub fn sys_error_json(code: &str, msg: &str) -> String {
    frame("sys", "error", json!({ "code": code, "msg": msg }))
}

pub fn snapshot_json(view: &DashboardView) -> String {
    frame("traffic", "snapshot", to_value(view))
}

/// Acknowledge a client request, echoing its `seq` when present.
pub fn ack_json(action: &str, seq: Option<u64>, view: &DashboardView) -> String {
    frame(
        "traffic",
        "ack",
        json!({
            "action": action,
            "seq": seq,
            "viewSeq": view.seq,
            "autoRefresh": view.auto_refresh,
        }),
    )
}

pub fn to_value<T: Serialize>(v: &T) -> Value {
    // Serialize impls here are derived over plain data; failure maps to null.
    serde_json::to_value(v).unwrap_or(Value::Null)
}
