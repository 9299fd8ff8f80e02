use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use {
    async_trait::async_trait,
    clawbridge_channels::{Channel, ChannelEventSink, RegisteredGroups, Result},
    serde_json::Value,
    tokio::sync::Mutex,
    tracing::{debug, error, info, warn},
};

use crate::{
    client::FeishuOpenApi,
    config::FeishuAccountConfig,
    event::MESSAGE_RECEIVE_EVENT,
    handlers,
    identity::{self, FEISHU_TAG},
    transport::{EventDispatcher, EventHandler, FeishuTransport, OutboundMessage, TransportHandle},
};

/// Feishu implementation of [`Channel`].
pub struct FeishuChannel {
    transport: Arc<dyn FeishuTransport>,
    sink: Arc<dyn ChannelEventSink>,
    groups: Arc<dyn RegisteredGroups>,
    session: Mutex<Option<Box<dyn TransportHandle>>>,
    connected: AtomicBool,
}

/// Receives `im.message.receive_v1` events from the transport.
struct MessageReceiveHandler {
    sink: Arc<dyn ChannelEventSink>,
    groups: Arc<dyn RegisteredGroups>,
}

#[async_trait]
impl EventHandler for MessageReceiveHandler {
    async fn handle(&self, event: Value) {
        handlers::handle_message_event_logged(&event, self.sink.as_ref(), self.groups.as_ref())
            .await;
    }
}

impl FeishuChannel {
    /// Build a channel backed by the Feishu Open Platform client.
    pub fn new(
        config: FeishuAccountConfig,
        sink: Arc<dyn ChannelEventSink>,
        groups: Arc<dyn RegisteredGroups>,
    ) -> crate::Result<Self> {
        let transport = FeishuOpenApi::new(config)?;
        Ok(Self::with_transport(Arc::new(transport), sink, groups))
    }

    pub fn with_transport(
        transport: Arc<dyn FeishuTransport>,
        sink: Arc<dyn ChannelEventSink>,
        groups: Arc<dyn RegisteredGroups>,
    ) -> Self {
        Self {
            transport,
            sink,
            groups,
            session: Mutex::new(None),
            connected: AtomicBool::new(false),
        }
    }

    fn dispatcher(&self) -> EventDispatcher {
        EventDispatcher::new().register(
            MESSAGE_RECEIVE_EVENT,
            Arc::new(MessageReceiveHandler {
                sink: Arc::clone(&self.sink),
                groups: Arc::clone(&self.groups),
            }),
        )
    }
}

#[async_trait]
impl Channel for FeishuChannel {
    fn name(&self) -> &str {
        FEISHU_TAG
    }

    async fn connect(&self) -> Result<()> {
        let mut session = self.session.lock().await;
        if session.is_some() {
            warn!("feishu channel already connected");
            return Ok(());
        }

        info!("connecting to feishu");
        let handle = self
            .transport
            .start(self.dispatcher())
            .await
            .map_err(|e| e.into_channel("connect to feishu"))?;
        *session = Some(handle);
        self.connected.store(true, Ordering::SeqCst);
        info!("feishu channel connected");
        Ok(())
    }

    async fn send_message(&self, jid: &str, text: &str) -> Result<()> {
        let (receive_id, receive_id_type) = identity::resolve_recipient(jid)?;
        let message = OutboundMessage::text(receive_id, receive_id_type, text)
            .map_err(|e| e.into_channel("encode feishu message"))?;

        match self.transport.create_message(message).await {
            Ok(()) => {
                info!(jid, %receive_id_type, "feishu: message sent");
                Ok(())
            },
            Err(e) => {
                error!(jid, %receive_id_type, error = %e, "feishu: failed to send message");
                Err(e.into_channel(format!("send to {jid}")))
            },
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn disconnect(&self) -> Result<()> {
        let Some(handle) = self.session.lock().await.take() else {
            debug!("feishu channel not connected");
            return Ok(());
        };
        self.connected.store(false, Ordering::SeqCst);
        handle
            .close()
            .await
            .map_err(|e| e.into_channel("disconnect from feishu"))?;
        info!("feishu channel disconnected");
        Ok(())
    }
}
