use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    Channel(#[from] clawbridge_channels::Error),

    /// The Open API answered with a non-zero business code.
    #[error("feishu api error {code}: {msg}")]
    Api { code: i64, msg: String },

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn api(code: i64, msg: impl Into<String>) -> Self {
        Self::Api {
            code,
            msg: msg.into(),
        }
    }

    /// Convert into the shared channel error at the `Channel` trait boundary.
    pub(crate) fn into_channel(self, context: impl Into<String>) -> clawbridge_channels::Error {
        match self {
            Self::Channel(inner) => inner,
            other => clawbridge_channels::Error::external(context, other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
