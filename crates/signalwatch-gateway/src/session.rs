//! Per-session context handed to services.

use std::sync::Arc;

use axum::extract::ws::Message;
use tokio::sync::mpsc;

use signalwatch_core::error::{Result, SignalWatchError};

use crate::controller::RefreshController;

#[derive(Clone)]
pub struct SessionCtx {
    session_id: Arc<str>,
    controller: Arc<RefreshController>,
    out: mpsc::Sender<Message>,
}

impl SessionCtx {
    pub fn new(
        session_id: impl Into<Arc<str>>,
        controller: Arc<RefreshController>,
        out: mpsc::Sender<Message>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            controller,
            out,
        }
    }

    pub fn session_id(&self) -> &str { &self.session_id }
    pub fn controller(&self) -> &Arc<RefreshController> { &self.controller }

    /// Queue a text frame for this session only.
    pub async fn reply(&self, text: String) -> Result<()> {
        self.out
            .send(Message::Text(text))
            .await
            .map_err(|_| SignalWatchError::Internal("outbound channel closed".into()))
    }
}
