//! Rendered-prompt cache shared by all request handlers.
//!
//! Entries are keyed by the conversation they belong to and the original
//! message text, so a prior user turn that is sent again by the client gets
//! its context-augmented rendering back. Requests that name no conversation
//! share one default namespace.

use mini_moka::sync::{Cache, ConcurrentCacheExt};

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
struct CacheKey {
    conversation: Option<String>,
    content: String,
}

impl CacheKey {
    fn new(conversation: Option<&str>, content: &str) -> Self {
        CacheKey {
            conversation: conversation.map(str::to_owned),
            content: content.to_owned(),
        }
    }
}

/// Bounded, thread-safe map from original message content to rendered
/// prompt. Cloning is cheap and clones share storage.
#[derive(Clone)]
pub struct PromptCache {
    inner: Cache<CacheKey, String>,
}

impl PromptCache {
    pub fn new(max_entries: u64) -> Self {
        PromptCache {
            inner: Cache::builder().max_capacity(max_entries).build(),
        }
    }

    pub fn get(&self, conversation: Option<&str>, content: &str) -> Option<String> {
        self.inner.get(&CacheKey::new(conversation, content))
    }

    pub fn insert(&self, conversation: Option<&str>, content: &str, rendered: String) {
        self.inner
            .insert(CacheKey::new(conversation, content), rendered);
    }

    /// Number of live entries after pending maintenance has run.
    pub fn entry_count(&self) -> u64 {
        self.inner.sync();
        self.inner.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let cache = PromptCache::new(100);
        cache.insert(None, "what is dora?", "Kontext: x\nNachricht: what is dora?".to_string());
        assert_eq!(
            cache.get(None, "what is dora?").as_deref(),
            Some("Kontext: x\nNachricht: what is dora?")
        );
        assert!(cache.get(None, "something else").is_none());
    }

    #[test]
    fn test_conversations_do_not_share_entries() {
        let cache = PromptCache::new(100);
        cache.insert(Some("conv-a"), "hello", "rendered for a".to_string());
        cache.insert(Some("conv-b"), "hello", "rendered for b".to_string());
        assert_eq!(cache.get(Some("conv-a"), "hello").as_deref(), Some("rendered for a"));
        assert_eq!(cache.get(Some("conv-b"), "hello").as_deref(), Some("rendered for b"));
        assert!(cache.get(None, "hello").is_none());
    }

    #[test]
    fn test_later_insert_replaces() {
        let cache = PromptCache::new(100);
        cache.insert(None, "hello", "first".to_string());
        cache.insert(None, "hello", "second".to_string());
        assert_eq!(cache.get(None, "hello").as_deref(), Some("second"));
    }

    #[test]
    fn test_capacity_is_bounded() {
        let cache = PromptCache::new(8);
        for i in 0..200 {
            cache.insert(None, &format!("message {i}"), format!("rendered {i}"));
        }
        assert!(cache.entry_count() <= 8);
    }

    #[test]
    fn test_clones_share_storage() {
        let cache = PromptCache::new(10);
        let handle = cache.clone();
        handle.insert(Some("c"), "q", "r".to_string());
        assert_eq!(cache.get(Some("c"), "q").as_deref(), Some("r"));
    }
}
