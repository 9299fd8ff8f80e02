use {
    clawbridge_channels::Error as ChannelError,
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
};

use crate::Result;

/// Open Platform endpoint for Feishu (mainland China).
pub const FEISHU_DOMAIN: &str = "https://open.feishu.cn";

/// Open Platform endpoint for Lark (international).
pub const LARK_DOMAIN: &str = "https://open.larksuite.com";

/// Credentials and endpoint for one Feishu app.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct FeishuAccountConfig {
    /// App ID from the developer console (`cli_...`).
    pub app_id: String,

    pub app_secret: Secret<String>,

    /// Open Platform base URL, without a trailing slash.
    pub domain: String,

    /// Token echoed in event callbacks. Callbacks carrying a different token
    /// are rejected when this is set.
    pub verification_token: Option<Secret<String>>,
}

impl FeishuAccountConfig {
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: Secret::new(app_secret.into()),
            ..Default::default()
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_verification_token(mut self, token: impl Into<String>) -> Self {
        self.verification_token = Some(Secret::new(token.into()));
        self
    }

    /// Reject configs that cannot possibly authenticate.
    pub fn validate(&self) -> Result<()> {
        if self.app_id.trim().is_empty() {
            return Err(ChannelError::invalid_input("feishu app_id is required").into());
        }
        if self.app_secret.expose_secret().is_empty() {
            return Err(ChannelError::invalid_input("feishu app_secret is required").into());
        }
        Ok(())
    }

    pub(crate) fn base_url(&self) -> &str {
        self.domain.trim_end_matches('/')
    }
}

impl std::fmt::Debug for FeishuAccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeishuAccountConfig")
            .field("app_id", &self.app_id)
            .field("app_secret", &"[REDACTED]")
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

impl Default for FeishuAccountConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            app_secret: Secret::new(String::new()),
            domain: FEISHU_DOMAIN.to_string(),
            verification_token: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = FeishuAccountConfig::default();
        assert_eq!(cfg.domain, FEISHU_DOMAIN);
        assert!(cfg.app_id.is_empty());
        assert!(cfg.verification_token.is_none());
    }

    #[test]
    fn deserialize_from_json() {
        let json = r#"{
            "app_id": "cli_a1b2",
            "app_secret": "s3cret",
            "domain": "https://open.larksuite.com"
        }"#;
        let cfg: FeishuAccountConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.app_id, "cli_a1b2");
        assert_eq!(cfg.app_secret.expose_secret(), "s3cret");
        assert_eq!(cfg.domain, LARK_DOMAIN);
        assert!(cfg.verification_token.is_none());
    }

    #[test]
    fn debug_redacts_secret() {
        let cfg = FeishuAccountConfig::new("cli_a1b2", "s3cret");
        let rendered = format!("{cfg:?}");
        assert!(rendered.contains("cli_a1b2"));
        assert!(!rendered.contains("s3cret"));
    }

    #[test]
    fn validate_requires_credentials() {
        assert!(FeishuAccountConfig::new("cli_a1b2", "s3cret").validate().is_ok());
        assert!(FeishuAccountConfig::new("", "s3cret").validate().is_err());
        assert!(FeishuAccountConfig::new("cli_a1b2", "").validate().is_err());
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let cfg = FeishuAccountConfig::default().with_domain("http://127.0.0.1:8080/");
        assert_eq!(cfg.base_url(), "http://127.0.0.1:8080");
    }
}
