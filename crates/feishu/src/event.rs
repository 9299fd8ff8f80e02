//! Decoding and normalization of `im.message.receive_v1` events.
//!
//! The raw event is loosely typed JSON. Fields are read explicitly so a
//! missing field and a field of the wrong type produce distinct errors.

use {
    chrono::{DateTime, SecondsFormat},
    clawbridge_channels::{ChatMetadata, InboundMessage},
    serde::Deserialize,
    serde_json::Value,
    thiserror::Error,
};

use crate::{
    identity::{self, FEISHU_TAG},
    post::PostMessageContent,
};

/// Event type for a message received by the bot.
pub const MESSAGE_RECEIVE_EVENT: &str = "im.message.receive_v1";

/// Sender name used when the event carries none.
pub const UNKNOWN_SENDER: &str = "Unknown";

/// Why an event produced no message.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` is not {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("invalid {message_type} content: {source}")]
    InvalidContent {
        message_type: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("create_time {0} is out of range")]
    InvalidTimestamp(i64),

    /// The message decoded to no usable text.
    #[error("message has no text content")]
    EmptyText,
}

impl NormalizeError {
    /// Expected drops that are not worth more than a debug log.
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::EmptyText)
    }
}

type Result<T> = std::result::Result<T, NormalizeError>;

/// Decoded message body.
#[derive(Debug, Clone)]
pub enum MessageBody {
    Text(String),
    Post(PostMessageContent),
    /// Images, files, stickers and other types this adapter does not handle.
    Unsupported(String),
}

#[derive(Debug, Deserialize)]
struct TextContent {
    #[serde(default)]
    text: Option<String>,
}

impl MessageBody {
    /// Decode `content` according to `message_type`.
    pub fn decode(message_type: &str, content: Option<&str>) -> Result<Self> {
        let invalid = |source: serde_json::Error| NormalizeError::InvalidContent {
            message_type: message_type.to_string(),
            source,
        };
        match message_type {
            "text" => {
                let content = content.ok_or(NormalizeError::MissingField("message.content"))?;
                let decoded: TextContent = serde_json::from_str(content).map_err(invalid)?;
                Ok(Self::Text(decoded.text.unwrap_or_default()))
            },
            "post" => {
                let content = content.ok_or(NormalizeError::MissingField("message.content"))?;
                let decoded: PostMessageContent = serde_json::from_str(content).map_err(invalid)?;
                Ok(Self::Post(decoded))
            },
            other => Ok(Self::Unsupported(other.to_string())),
        }
    }

    pub fn plain_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Post(post) => post.plain_text(),
            Self::Unsupported(_) => String::new(),
        }
    }
}

/// Sender block of a message event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSender {
    pub open_id: Option<String>,
    pub name: Option<String>,
}

/// Typed view of an `im.message.receive_v1` event with non-empty text.
#[derive(Debug, Clone)]
pub struct MessageReceiveEvent {
    pub message_id: String,
    pub chat_id: String,
    pub chat_type: Option<String>,
    /// Epoch seconds.
    pub create_time: i64,
    pub text: String,
    pub sender: EventSender,
}

impl MessageReceiveEvent {
    /// Decode a raw event, failing with [`NormalizeError::EmptyText`] before
    /// touching chat or sender fields when the body carries no text.
    pub fn from_value(raw: &Value) -> Result<Self> {
        let message = object_field(raw, "message")?;

        let message_type = str_field(message, "message_type", "message.message_type")?;
        let content = opt_str_field(message, "content", "message.content")?;
        let text = MessageBody::decode(message_type, content)?.plain_text();
        if text.is_empty() {
            return Err(NormalizeError::EmptyText);
        }

        let message_id = str_field(message, "message_id", "message.message_id")?.to_string();
        let chat_id = str_field(message, "chat_id", "message.chat_id")?.to_string();
        let chat_type = match opt_str_field(message, "chat_type", "message.chat_type")? {
            Some(t) => Some(t.to_string()),
            None => opt_str_field(raw, "chat_type", "chat_type")?.map(str::to_string),
        };
        let create_time = epoch_field(message, "create_time", "message.create_time")?;
        let sender = parse_sender(raw)?;

        Ok(Self {
            message_id,
            chat_id,
            chat_type,
            create_time,
            text,
            sender,
        })
    }

    pub fn is_group(&self) -> bool {
        self.chat_type.as_deref() == Some("group")
    }
}

/// Metadata and message built from one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEvent {
    pub metadata: ChatMetadata,
    pub message: InboundMessage,
}

/// Map a raw event onto the bridge schema.
pub fn normalize(raw: &Value) -> Result<NormalizedEvent> {
    let event = MessageReceiveEvent::from_value(raw)?;
    let chat_jid = identity::chat_jid(&event.chat_id);
    let timestamp = iso_timestamp(event.create_time)?;

    let metadata = ChatMetadata {
        chat_jid: chat_jid.clone(),
        timestamp: timestamp.clone(),
        name: None,
        channel: FEISHU_TAG.to_string(),
        is_group: event.is_group(),
    };
    let message = InboundMessage {
        id: event.message_id,
        chat_jid,
        sender: event.sender.open_id.unwrap_or_default(),
        sender_name: event
            .sender
            .name
            .unwrap_or_else(|| UNKNOWN_SENDER.to_string()),
        text: event.text,
        timestamp,
        is_from_self: false,
        is_automated: false,
    };
    Ok(NormalizedEvent { metadata, message })
}

/// Render epoch seconds as an ISO-8601 UTC instant with milliseconds.
pub fn iso_timestamp(epoch_secs: i64) -> Result<String> {
    DateTime::from_timestamp(epoch_secs, 0)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or(NormalizeError::InvalidTimestamp(epoch_secs))
}

fn parse_sender(raw: &Value) -> Result<EventSender> {
    let sender = match raw.get("sender") {
        None | Some(Value::Null) => return Ok(EventSender::default()),
        Some(v @ Value::Object(_)) => v,
        Some(_) => {
            return Err(NormalizeError::WrongType {
                field: "sender",
                expected: "an object",
            });
        },
    };
    let sender_id = match sender.get("sender_id") {
        None | Some(Value::Null) => return Ok(EventSender::default()),
        Some(v @ Value::Object(_)) => v,
        Some(_) => {
            return Err(NormalizeError::WrongType {
                field: "sender.sender_id",
                expected: "an object",
            });
        },
    };
    Ok(EventSender {
        open_id: opt_str_field(sender_id, "open_id", "sender.sender_id.open_id")?
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        name: opt_str_field(sender_id, "name", "sender.sender_id.name")?
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    })
}

fn object_field<'a>(obj: &'a Value, field: &'static str) -> Result<&'a Value> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(NormalizeError::MissingField(field)),
        Some(v @ Value::Object(_)) => Ok(v),
        Some(_) => Err(NormalizeError::WrongType {
            field,
            expected: "an object",
        }),
    }
}

fn str_field<'a>(obj: &'a Value, key: &str, field: &'static str) -> Result<&'a str> {
    opt_str_field(obj, key, field)?.ok_or(NormalizeError::MissingField(field))
}

fn opt_str_field<'a>(obj: &'a Value, key: &str, field: &'static str) -> Result<Option<&'a str>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(NormalizeError::WrongType {
            field,
            expected: "a string",
        }),
    }
}

/// Epoch seconds sent either as a JSON integer or a numeric string.
fn epoch_field(obj: &Value, key: &str, field: &'static str) -> Result<i64> {
    let wrong_type = NormalizeError::WrongType {
        field,
        expected: "an integer timestamp",
    };
    match obj.get(key) {
        None | Some(Value::Null) => Err(NormalizeError::MissingField(field)),
        Some(Value::Number(n)) => n.as_i64().ok_or(wrong_type),
        Some(Value::String(s)) => s.trim().parse().map_err(|_| wrong_type),
        Some(_) => Err(wrong_type),
    }
}
