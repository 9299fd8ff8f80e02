use {async_trait::async_trait, serde::Serialize};

use crate::{Result, jid};

/// A provider message normalized into the bridge's schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InboundMessage {
    /// Provider-native message id.
    pub id: String,
    /// Canonical address of the conversation.
    pub chat_jid: String,
    /// Provider-native sender id, empty when the provider omits it.
    pub sender: String,
    /// Human-readable sender name.
    pub sender_name: String,
    /// Plain text body, never empty.
    pub text: String,
    /// ISO-8601 instant the provider recorded for the message.
    pub timestamp: String,
    pub is_from_self: bool,
    pub is_automated: bool,
}

/// Side-channel notice that a chat showed activity.
///
/// Emitted for every actionable inbound event, registered or not, so the
/// bridge can track chats that are not yet registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMetadata {
    pub chat_jid: String,
    /// ISO-8601 time of the latest activity.
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Tag of the adapter that saw the activity (e.g. "feishu").
    pub channel: String,
    pub is_group: bool,
}

/// Receiver for inbound traffic; the bridge provides the implementation.
#[async_trait]
pub trait ChannelEventSink: Send + Sync {
    /// Deliver a message from a registered chat.
    async fn on_message(&self, chat_jid: &str, message: InboundMessage);

    /// Record chat activity, including for unregistered chats.
    async fn on_chat_metadata(&self, metadata: ChatMetadata);
}

/// Contract every provider adapter implements.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Adapter tag, also the prefix of every jid this adapter owns.
    fn name(&self) -> &str;

    /// Open the provider connection and start receiving events.
    async fn connect(&self) -> Result<()>;

    /// Send plain text to the conversation behind `jid`.
    async fn send_message(&self, jid: &str, text: &str) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// Whether `jid` belongs to this adapter.
    fn owns_jid(&self, jid: &str) -> bool {
        jid::has_tag(self.name(), jid)
    }

    /// Tear down the provider connection. A no-op when already disconnected.
    async fn disconnect(&self) -> Result<()>;
}
