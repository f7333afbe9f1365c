use async_trait::async_trait;
use serde::Deserialize;

use signalwatch_core::error::{Result, SignalWatchError};
use signalwatch_core::protocol::text::Envelope;

use crate::controller::RefreshTrigger;
use crate::dispatch::TextService;
use crate::session::SessionCtx;
use crate::transport::outbound::{ack_json, frame, snapshot_json, to_value};

/// Dashboard actions over the WebSocket:
/// `refresh`, `toggle_auto`, `set_auto`, `get`, `signals`.
#[derive(Default)]
pub struct TrafficService;

impl TrafficService {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SetAutoReq {
    enabled: bool,
}

#[async_trait]
impl TextService for TrafficService {
    fn svc(&self) -> &'static str {
        "traffic"
    }

    async fn handle(&self, ctx: SessionCtx, env: Envelope) -> Result<()> {
        let controller = ctx.controller();
        match env.msg_type.as_str() {
            "refresh" => {
                let view = controller.refresh(RefreshTrigger::Manual);
                ctx.reply(ack_json("refresh", env.seq, &view)).await
            }
            "toggle_auto" => {
                let enabled = controller.toggle_auto_refresh()?;
                tracing::debug!(session = ctx.session_id(), enabled, "auto-refresh toggled");
                ctx.reply(ack_json("toggle_auto", env.seq, &controller.current())).await
            }
            "set_auto" => {
                let req: SetAutoReq = env.data_as()?;
                controller.set_auto_refresh(req.enabled)?;
                tracing::debug!(session = ctx.session_id(), enabled = req.enabled, "auto-refresh set");
                ctx.reply(ack_json("set_auto", env.seq, &controller.current())).await
            }
            "get" => ctx.reply(snapshot_json(&controller.current())).await,
            "signals" => {
                let report = controller.signal_report();
                ctx.reply(frame("traffic", "signals", to_value(&report))).await
            }
            other => Err(SignalWatchError::BadRequest(format!("unknown traffic type: {other}"))),
        }
    }
}
