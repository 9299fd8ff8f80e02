use std::{collections::HashMap, sync::RwLock};

use serde::{Deserialize, Serialize};

/// Bridge-side registration of a chat for full message delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredGroup {
    /// Display name chosen when the chat was registered.
    pub name: String,
    /// Working folder the bridge associates with the chat.
    pub folder: String,
    /// Trigger word the bridge looks for, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    /// ISO-8601 registration time.
    pub added_at: String,
}

/// Read-only view of the bridge's registration table.
///
/// Adapters call [`lookup`](RegisteredGroups::lookup) once per inbound event
/// and never keep the answer, since the bridge may register or unregister a
/// chat between two events.
pub trait RegisteredGroups: Send + Sync {
    fn lookup(&self, jid: &str) -> Option<RegisteredGroup>;
}

impl RegisteredGroups for RwLock<HashMap<String, RegisteredGroup>> {
    fn lookup(&self, jid: &str) -> Option<RegisteredGroup> {
        let groups = self.read().unwrap_or_else(|e| e.into_inner());
        groups.get(jid).cloned()
    }
}
