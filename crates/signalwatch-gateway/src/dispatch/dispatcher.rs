use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use signalwatch_core::error::{Result, SignalWatchError};
use signalwatch_core::protocol::text::Envelope;

use crate::session::SessionCtx;

/// Handler for one `svc` namespace of inbound text envelopes.
#[async_trait]
pub trait TextService: Send + Sync {
    fn svc(&self) -> &'static str;
    async fn handle(&self, ctx: SessionCtx, env: Envelope) -> Result<()>;
}

/// Registry and dispatcher for text services.
#[derive(Default)]
pub struct Dispatcher {
    text: DashMap<&'static str, Arc<dyn TextService>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            text: DashMap::new(),
        }
    }

    pub fn register_text(&self, svc: Arc<dyn TextService>) {
        self.text.insert(svc.svc(), svc);
    }

    pub fn registered_text_svcs(&self) -> Vec<&'static str> {
        self.text.iter().map(|e| *e.key()).collect()
    }

    pub async fn dispatch_text(&self, ctx: SessionCtx, env: Envelope) -> Result<()> {
        let svc = env.svc.as_str();
        // clone out of the map so no shard lock is held across the await
        let handler = self
            .text
            .get(svc)
            .ok_or_else(|| SignalWatchError::BadRequest(format!("unknown svc: {svc}")))?
            .value()
            .clone();
        handler.handle(ctx, env).await
    }
}
