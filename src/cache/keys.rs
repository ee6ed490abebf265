//! Cache key construction.
//!
//! Keys are plain strings so they can be shared with an external store. The
//! nick is form-encoded, which keeps characters like `&` or `=` from forging
//! another request's key.

use url::form_urlencoded::byte_serialize;

/// Builds namespaced cache keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    namespace: String,
}

impl CacheKeys {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Key for one page of a per-user feed.
    ///
    /// Syndication requests get their own slot because their items carry
    /// rendered content that page views never do.
    pub fn reply_feed(&self, op_tag: &str, nick: &str, offset: u64, syndication: bool) -> String {
        let encoded_nick: String = byte_serialize(nick.as_bytes()).collect();
        let mut key = format!(
            "{}:{op_tag}?id={encoded_nick}&offset={offset}",
            self.namespace
        );
        if syndication {
            key.push_str("&output=true");
        }
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> CacheKeys {
        CacheKeys::new("test")
    }

    #[test]
    fn identical_inputs_produce_identical_keys() {
        let first = keys().reply_feed("show-replies", "alice", 20, false);
        let second = keys().reply_feed("show-replies", "alice", 20, false);
        assert_eq!(first, second);
        assert_eq!(first, "test:show-replies?id=alice&offset=20");
    }

    #[test]
    fn syndication_flag_changes_key() {
        let page = keys().reply_feed("show-replies", "alice", 0, false);
        let feed = keys().reply_feed("show-replies", "alice", 0, true);
        assert_ne!(page, feed);
        assert!(feed.ends_with("&output=true"));
    }

    #[test]
    fn offsets_and_tags_are_distinct() {
        let base = keys().reply_feed("show-replies", "alice", 0, false);
        assert_ne!(base, keys().reply_feed("show-replies", "alice", 1, false));
        assert_ne!(base, keys().reply_feed("show-topics", "alice", 0, false));
        assert_ne!(base, CacheKeys::new("other").reply_feed("show-replies", "alice", 0, false));
    }

    #[test]
    fn structural_characters_are_encoded() {
        let forged = keys().reply_feed("show-replies", "a&offset=1", 0, false);
        let plain = keys().reply_feed("show-replies", "a", 1, false);
        assert_ne!(forged, plain);
        assert!(forged.contains("a%26offset%3D1"), "{forged}");
        assert!(
            keys()
                .reply_feed("show-replies", "a b", 0, false)
                .contains("id=a+b&")
        );
    }
}
