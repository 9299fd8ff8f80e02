//! Boundary between the adapter and the Feishu transport.
//!
//! The transport owns authentication and the event connection; the adapter
//! only hands it an [`EventDispatcher`] on start and [`OutboundMessage`]s to
//! deliver.

use std::{collections::HashMap, fmt, sync::Arc};

use {async_trait::async_trait, serde::Serialize, serde_json::Value, tracing::debug};

use crate::{Result, identity::ReceiveIdType};

/// Callback for one event type.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: Value);
}

/// Table of event handlers keyed by event type (e.g. `im.message.receive_v1`).
#[derive(Clone, Default)]
pub struct EventDispatcher {
    handlers: HashMap<String, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, event_type: impl Into<String>, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers.insert(event_type.into(), handler);
        self
    }

    pub fn event_types(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    /// Run the handler for `event_type`. Returns `false` when none is registered.
    pub async fn dispatch(&self, event_type: &str, event: Value) -> bool {
        match self.handlers.get(event_type) {
            Some(handler) => {
                handler.handle(event).await;
                true
            },
            None => {
                debug!(event_type, "no handler registered for feishu event");
                false
            },
        }
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("event_types", &self.event_types())
            .finish()
    }
}

/// A single IM message create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub receive_id: String,
    #[serde(skip)]
    pub receive_id_type: ReceiveIdType,
    pub msg_type: String,
    /// JSON-encoded content, e.g. `{"text":"hi"}` for `msg_type = "text"`.
    pub content: String,
}

impl OutboundMessage {
    pub fn text(
        receive_id: impl Into<String>,
        receive_id_type: ReceiveIdType,
        text: &str,
    ) -> Result<Self> {
        Ok(Self {
            receive_id: receive_id.into(),
            receive_id_type,
            msg_type: "text".into(),
            content: serde_json::to_string(&serde_json::json!({ "text": text }))?,
        })
    }
}

/// A live transport session. Closing it stops event delivery.
#[async_trait]
pub trait TransportHandle: Send + Sync {
    async fn close(&self) -> Result<()>;
}

/// Provider transport used by `FeishuChannel`.
#[async_trait]
pub trait FeishuTransport: Send + Sync {
    /// Authenticate and start delivering events to `dispatcher`.
    async fn start(&self, dispatcher: EventDispatcher) -> Result<Box<dyn TransportHandle>>;

    async fn create_message(&self, message: OutboundMessage) -> Result<()>;
}
