use std::sync::Arc;

use tracing::{debug, warn};

use crate::{Error, Result, plugin::Channel};

/// Registry of every connected adapter, used to route outbound sends.
#[derive(Default)]
pub struct ChannelRegistry {
    channels: Vec<Arc<dyn Channel>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an adapter, replacing any previous one with the same name.
    pub fn register(&mut self, channel: Arc<dyn Channel>) {
        if let Some(pos) = self
            .channels
            .iter()
            .position(|c| c.name() == channel.name())
        {
            warn!(channel = channel.name(), "replacing registered channel");
            self.channels[pos] = channel;
        } else {
            self.channels.push(channel);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Channel>> {
        self.channels.iter().find(|c| c.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// The adapter that claims `jid`, if any.
    pub fn owner_of(&self, jid: &str) -> Option<Arc<dyn Channel>> {
        self.channels.iter().find(|c| c.owns_jid(jid)).cloned()
    }

    /// Route an outbound message to the adapter owning `jid`.
    pub async fn send_message(&self, jid: &str, text: &str) -> Result<()> {
        let channel = self.owner_of(jid).ok_or_else(|| Error::no_owner(jid))?;
        debug!(channel = channel.name(), jid, "routing outbound message");
        channel.send_message(jid, text).await
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        async_trait::async_trait,
        std::sync::{
            Mutex,
            atomic::{AtomicBool, Ordering},
        },
    };

    struct StubChannel {
        name: &'static str,
        connected: AtomicBool,
        sent: Mutex<Vec<(String, String)>>,
    }

    impl StubChannel {
        fn new(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                connected: AtomicBool::new(false),
                sent: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Channel for StubChannel {
        fn name(&self) -> &str {
            self.name
        }

        async fn connect(&self) -> Result<()> {
            self.connected.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn send_message(&self, jid: &str, text: &str) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((jid.to_string(), text.to_string()));
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }

        async fn disconnect(&self) -> Result<()> {
            self.connected.store(false, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn owner_of_uses_prefix() {
        let mut registry = ChannelRegistry::new();
        registry.register(StubChannel::new("feishu"));
        registry.register(StubChannel::new("slack"));

        assert_eq!(registry.owner_of("feishu:oc_1").unwrap().name(), "feishu");
        assert_eq!(registry.owner_of("slack:C1").unwrap().name(), "slack");
        assert!(registry.owner_of("telegram:42").is_none());
    }

    #[test]
    fn register_replaces_same_name() {
        let mut registry = ChannelRegistry::new();
        registry.register(StubChannel::new("feishu"));
        registry.register(StubChannel::new("feishu"));
        assert_eq!(registry.names(), vec!["feishu"]);
    }

    #[tokio::test]
    async fn send_message_routes_to_owner() {
        let feishu = StubChannel::new("feishu");
        let slack = StubChannel::new("slack");
        let mut registry = ChannelRegistry::new();
        registry.register(feishu.clone());
        registry.register(slack.clone());

        registry.send_message("feishu:oc_9", "hi").await.unwrap();

        assert_eq!(
            *feishu.sent.lock().unwrap(),
            vec![("feishu:oc_9".to_string(), "hi".to_string())]
        );
        assert!(slack.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn send_message_without_owner_fails() {
        let registry = ChannelRegistry::new();
        let err = registry.send_message("feishu:oc_9", "hi").await.unwrap_err();
        assert!(matches!(err, Error::NoOwner { jid } if jid == "feishu:oc_9"));
    }
}
