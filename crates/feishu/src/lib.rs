//! Feishu channel adapter for the bridge.
//!
//! Implements `Channel` on top of the Feishu Open Platform: inbound
//! `im.message.receive_v1` events are normalized into `InboundMessage`s,
//! and outbound text is sent with the IM message API.

pub mod channel;
pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod handlers;
pub mod identity;
pub mod post;
pub mod transport;

pub use {
    channel::FeishuChannel,
    client::FeishuOpenApi,
    config::FeishuAccountConfig,
    error::{Error, Result},
    identity::FEISHU_TAG,
};
