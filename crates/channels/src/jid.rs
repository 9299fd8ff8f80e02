//! Canonical chat addresses ("jids").
//!
//! A jid is `<tag>:<native id>`, where the tag names the adapter that owns
//! the conversation. Tags are unique per adapter, so jids from different
//! providers never collide.

/// Separator between the adapter tag and the provider-native id.
pub const JID_SEPARATOR: char = ':';

/// Build a canonical jid from an adapter tag and a provider-native id.
pub fn make_jid(tag: &str, native_id: &str) -> String {
    format!("{tag}{JID_SEPARATOR}{native_id}")
}

/// Whether `jid` carries the `tag` prefix followed by the separator.
pub fn has_tag(tag: &str, jid: &str) -> bool {
    strip_jid(tag, jid).is_some()
}

/// Strip the `<tag>:` prefix, returning the provider-native id.
///
/// Returns `None` when the jid belongs to another adapter.
pub fn strip_jid<'a>(tag: &str, jid: &'a str) -> Option<&'a str> {
    jid.strip_prefix(tag)?.strip_prefix(JID_SEPARATOR)
}
