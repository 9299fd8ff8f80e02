use {
    clawbridge_channels::{Error as ChannelError, jid},
    serde::Serialize,
};

/// Adapter tag; every Feishu jid starts with `feishu:`.
pub const FEISHU_TAG: &str = "feishu";

/// Prefix Feishu gives to chat ids (`chat_id`).
const CHAT_ID_PREFIX: &str = "oc_";

/// How the IM API should interpret a `receive_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiveIdType {
    /// A chat (`oc_...`), used for groups.
    ChatId,
    /// A user's open id (`ou_...`), used for direct messages.
    OpenId,
}

impl ReceiveIdType {
    /// Classify a provider id by its literal prefix.
    pub fn classify(native_id: &str) -> Self {
        if native_id.starts_with(CHAT_ID_PREFIX) {
            Self::ChatId
        } else {
            Self::OpenId
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ChatId => "chat_id",
            Self::OpenId => "open_id",
        }
    }
}

impl std::fmt::Display for ReceiveIdType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Feishu chat id to canonical jid.
pub fn chat_jid(chat_id: &str) -> String {
    jid::make_jid(FEISHU_TAG, chat_id)
}

/// Canonical jid back to the Feishu id it was built from.
pub fn native_id(chat_jid: &str) -> Option<&str> {
    jid::strip_jid(FEISHU_TAG, chat_jid)
}

/// Resolve an outbound jid to the recipient id and its id type.
pub fn resolve_recipient(chat_jid: &str) -> clawbridge_channels::Result<(&str, ReceiveIdType)> {
    let id = native_id(chat_jid)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ChannelError::invalid_input(format!("not a feishu jid: {chat_jid}")))?;
    Ok((id, ReceiveIdType::classify(id)))
}
