use {dashmap::DashMap, relaybot_config::ProviderTag};

/// Per-user provider choice for the lifetime of the process.
///
/// Keyed by Telegram user id; last write wins. Nothing is persisted.
#[derive(Debug, Default)]
pub struct PreferenceStore {
    entries: DashMap<u64, ProviderTag>,
}

impl PreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `tag` for `user_id`, returning the previous choice.
    pub fn select(&self, user_id: u64, tag: ProviderTag) -> Option<ProviderTag> {
        self.entries.insert(user_id, tag)
    }

    pub fn get(&self, user_id: u64) -> Option<ProviderTag> {
        self.entries.get(&user_id).map(|entry| *entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reselection_overwrites() {
        let store = PreferenceStore::new();
        assert_eq!(store.get(1), None);
        assert_eq!(store.select(1, ProviderTag::ChatGpt), None);
        assert_eq!(
            store.select(1, ProviderTag::Gemini),
            Some(ProviderTag::ChatGpt)
        );
        assert_eq!(store.get(1), Some(ProviderTag::Gemini));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn users_are_independent() {
        let store = PreferenceStore::new();
        store.select(1, ProviderTag::ChatGpt);
        store.select(2, ProviderTag::Gemini);
        assert_eq!(store.get(1), Some(ProviderTag::ChatGpt));
        assert_eq!(store.get(2), Some(ProviderTag::Gemini));
        assert!(!store.is_empty());
    }
}
