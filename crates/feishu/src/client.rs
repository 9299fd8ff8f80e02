//! Feishu Open Platform client: tenant token, IM message create and the
//! event-subscription callback intake.
//!
//! Events are received only through the HTTP callback. The websocket
//! long-connection mode is not supported.

use std::{
    sync::{Arc, RwLock},
    time::{Duration, Instant},
};

use {
    async_trait::async_trait,
    clawbridge_channels::Error as ChannelError,
    secrecy::ExposeSecret,
    serde::{Deserialize, Serialize},
    serde_json::Value,
    tokio::sync::Mutex,
    tracing::{debug, info, warn},
};

use crate::{
    Error, Result,
    config::FeishuAccountConfig,
    transport::{EventDispatcher, FeishuTransport, OutboundMessage, TransportHandle},
};

const TENANT_TOKEN_PATH: &str = "/open-apis/auth/v3/tenant_access_token/internal";
const MESSAGES_PATH: &str = "/open-apis/im/v1/messages";

/// Refresh the tenant token this long before Feishu expires it.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

type SharedDispatcher = Arc<RwLock<Option<EventDispatcher>>>;

/// Feishu Open Platform client.
///
/// Sends messages with the IM API and receives events through
/// [`handle_callback`](Self::handle_callback), which the host wires to the
/// app's event subscription URL.
pub struct FeishuOpenApi {
    http: reqwest::Client,
    config: FeishuAccountConfig,
    token: Mutex<Option<CachedToken>>,
    dispatcher: SharedDispatcher,
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

#[derive(Serialize)]
struct TenantTokenRequest<'a> {
    app_id: &'a str,
    app_secret: &'a str,
}

#[derive(Deserialize)]
struct TenantTokenResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    tenant_access_token: Option<String>,
    /// Lifetime in seconds.
    #[serde(default)]
    expire: u64,
}

#[derive(Deserialize)]
struct ApiResponse {
    code: i64,
    #[serde(default)]
    msg: String,
}

/// What the callback endpoint should answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackResponse {
    /// URL verification handshake; reply with `{"challenge": ...}`.
    Challenge(String),
    /// Event was dispatched to a handler.
    Dispatched,
    /// No handler is registered for the event type.
    Ignored,
}

impl CallbackResponse {
    /// JSON body to return to Feishu.
    pub fn body(&self) -> Value {
        match self {
            Self::Challenge(challenge) => serde_json::json!({ "challenge": challenge }),
            Self::Dispatched | Self::Ignored => serde_json::json!({}),
        }
    }
}

impl FeishuOpenApi {
    pub fn new(config: FeishuAccountConfig) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self::with_client(http, config))
    }

    pub fn with_client(http: reqwest::Client, config: FeishuAccountConfig) -> Self {
        Self {
            http,
            config,
            token: Mutex::new(None),
            dispatcher: Arc::new(RwLock::new(None)),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url())
    }

    /// Current tenant access token, fetched again when close to expiry.
    pub async fn tenant_access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref()
            && Instant::now() < token.refresh_at
        {
            return Ok(token.value.clone());
        }

        debug!(app_id = %self.config.app_id, "fetching feishu tenant access token");
        let response: TenantTokenResponse = self
            .http
            .post(self.url(TENANT_TOKEN_PATH))
            .json(&TenantTokenRequest {
                app_id: &self.config.app_id,
                app_secret: self.config.app_secret.expose_secret(),
            })
            .send()
            .await?
            .json()
            .await?;

        if response.code != 0 {
            return Err(Error::api(response.code, response.msg));
        }
        let value = response
            .tenant_access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::message("tenant_access_token missing from response"))?;

        let lifetime = Duration::from_secs(response.expire).saturating_sub(TOKEN_REFRESH_MARGIN);
        match Instant::now().checked_add(lifetime) {
            Some(refresh_at) => {
                *cached = Some(CachedToken {
                    value: value.clone(),
                    refresh_at,
                });
            },
            None => {
                warn!(expire = response.expire, "feishu: token lifetime out of range, not caching");
                *cached = None;
            },
        }
        Ok(value)
    }

    /// Process an event-subscription callback body.
    pub async fn handle_callback(&self, body: &Value) -> Result<CallbackResponse> {
        if body.get("encrypt").is_some() {
            return Err(ChannelError::invalid_input(
                "encrypted feishu callbacks are not supported; disable the encrypt key",
            )
            .into());
        }

        if body.get("type").and_then(Value::as_str) == Some("url_verification") {
            self.verify_token(body.get("token"))?;
            let challenge = body
                .get("challenge")
                .and_then(Value::as_str)
                .ok_or_else(|| ChannelError::invalid_input("url_verification without challenge"))?;
            info!("feishu: answering url verification");
            return Ok(CallbackResponse::Challenge(challenge.to_string()));
        }

        let header = body
            .get("header")
            .ok_or_else(|| ChannelError::invalid_input("feishu callback without header"))?;
        self.verify_token(header.get("token"))?;
        let event_type = header
            .get("event_type")
            .and_then(Value::as_str)
            .ok_or_else(|| ChannelError::invalid_input("feishu callback without event_type"))?;
        let event = body.get("event").cloned().unwrap_or(Value::Null);

        let dispatcher = self
            .dispatcher
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or_else(|| ChannelError::unavailable("feishu transport is not started"))?;

        if dispatcher.dispatch(event_type, event).await {
            Ok(CallbackResponse::Dispatched)
        } else {
            Ok(CallbackResponse::Ignored)
        }
    }

    fn verify_token(&self, token: Option<&Value>) -> Result<()> {
        let Some(expected) = self.config.verification_token.as_ref() else {
            return Ok(());
        };
        if token.and_then(Value::as_str) == Some(expected.expose_secret().as_str()) {
            Ok(())
        } else {
            warn!("feishu: callback verification token mismatch");
            Err(ChannelError::invalid_input("feishu verification token mismatch").into())
        }
    }
}

struct OpenApiSession {
    dispatcher: SharedDispatcher,
}

#[async_trait]
impl TransportHandle for OpenApiSession {
    async fn close(&self) -> Result<()> {
        self.dispatcher
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        Ok(())
    }
}

#[async_trait]
impl FeishuTransport for FeishuOpenApi {
    async fn start(&self, dispatcher: EventDispatcher) -> Result<Box<dyn TransportHandle>> {
        // Fails fast on bad credentials.
        self.tenant_access_token().await?;

        info!(
            app_id = %self.config.app_id,
            event_types = ?dispatcher.event_types(),
            "feishu event dispatcher installed"
        );
        *self.dispatcher.write().unwrap_or_else(|e| e.into_inner()) = Some(dispatcher);

        Ok(Box::new(OpenApiSession {
            dispatcher: Arc::clone(&self.dispatcher),
        }))
    }

    async fn create_message(&self, message: OutboundMessage) -> Result<()> {
        let token = self.tenant_access_token().await?;
        let response: ApiResponse = self
            .http
            .post(self.url(MESSAGES_PATH))
            .query(&[("receive_id_type", message.receive_id_type.as_str())])
            .bearer_auth(token)
            .json(&message)
            .send()
            .await?
            .json()
            .await?;

        if response.code != 0 {
            return Err(Error::api(response.code, response.msg));
        }
        Ok(())
    }
}
