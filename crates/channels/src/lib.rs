//! Channel contract for the bridge.
//!
//! Every chat provider (Feishu, WhatsApp, Telegram, etc.) implements the
//! [`Channel`] trait so the router can connect, disconnect and send through
//! any adapter the same way. Inbound traffic flows back through a
//! [`ChannelEventSink`], and adapters consult [`RegisteredGroups`] to decide
//! which chats receive full message delivery.

pub mod error;
pub mod groups;
pub mod jid;
pub mod plugin;
pub mod registry;

pub use {
    error::{Error, Result},
    groups::{RegisteredGroup, RegisteredGroups},
    plugin::{Channel, ChannelEventSink, ChatMetadata, InboundMessage},
    registry::ChannelRegistry,
};
