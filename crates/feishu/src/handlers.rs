use {
    clawbridge_channels::{ChannelEventSink, RegisteredGroups},
    serde_json::Value,
    tracing::{debug, error},
};

use crate::event::{self, NormalizeError};

/// What happened to an inbound event that was not dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Chat is not registered; only metadata was recorded.
    MetadataOnly,
    /// Metadata was recorded and the message delivered.
    Delivered,
}

/// Run one `im.message.receive_v1` event through the pipeline.
///
/// Metadata is emitted for every event with text. The registration table is
/// consulted after that, fresh for this event, and the message goes to the
/// sink only for registered chats.
pub async fn handle_message_event(
    raw: &Value,
    sink: &dyn ChannelEventSink,
    groups: &dyn RegisteredGroups,
) -> Result<Delivery, NormalizeError> {
    let normalized = event::normalize(raw)?;
    let chat_jid = normalized.message.chat_jid.clone();

    sink.on_chat_metadata(normalized.metadata).await;

    if groups.lookup(&chat_jid).is_none() {
        debug!(chat_jid, "feishu: ignoring message from unregistered chat");
        return Ok(Delivery::MetadataOnly);
    }

    debug!(
        chat_jid,
        message_id = %normalized.message.id,
        "feishu: delivering message"
    );
    sink.on_message(&chat_jid, normalized.message).await;
    Ok(Delivery::Delivered)
}

/// Handle an event and swallow any failure after logging it.
pub async fn handle_message_event_logged(
    raw: &Value,
    sink: &dyn ChannelEventSink,
    groups: &dyn RegisteredGroups,
) -> Option<Delivery> {
    debug!(
        message_id = ?raw.pointer("/message/message_id"),
        chat_id = ?raw.pointer("/message/chat_id"),
        "feishu: received message event"
    );
    match handle_message_event(raw, sink, groups).await {
        Ok(delivery) => Some(delivery),
        Err(e) if e.is_benign() => {
            debug!(
                message_id = ?raw.pointer("/message/message_id"),
                reason = %e,
                "feishu: dropping event"
            );
            None
        },
        Err(e) => {
            error!(
                error = %e,
                message_id = ?raw.pointer("/message/message_id"),
                chat_id = ?raw.pointer("/message/chat_id"),
                event = %raw,
                "feishu: error handling message event"
            );
            None
        },
    }
}
