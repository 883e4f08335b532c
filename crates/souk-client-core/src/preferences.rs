//! App preferences persisted alongside credentials.
//!
//! Language and theme ride the same storage surface as the token pair and
//! inherit its fail-soft behavior: a preference that fails to persist is
//! simply dropped.

use crate::storage::{SecureKeyValueStore, keys};

/// Typed accessors for the preference keys.
#[derive(Clone)]
pub struct Preferences {
    store: SecureKeyValueStore,
}

impl Preferences {
    pub fn new(store: SecureKeyValueStore) -> Self {
        Self { store }
    }

    pub async fn language(&self) -> Option<String> {
        self.store.get(keys::APP_LANG).await
    }

    pub async fn set_language(&self, lang: &str) {
        self.store.save(keys::APP_LANG, lang).await;
    }

    pub async fn theme(&self) -> Option<String> {
        self.store.get(keys::APP_THEME).await
    }

    pub async fn set_theme(&self, theme: &str) {
        self.store.save(keys::APP_THEME, theme).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::MemoryBackend;

    #[tokio::test]
    async fn preferences_roundtrip() {
        let store = SecureKeyValueStore::with_backend(Arc::new(MemoryBackend::new()));
        let prefs = Preferences::new(store);

        assert_eq!(prefs.language().await, None);
        prefs.set_language("fa").await;
        prefs.set_theme("dark").await;

        assert_eq!(prefs.language().await.as_deref(), Some("fa"));
        assert_eq!(prefs.theme().await.as_deref(), Some("dark"));
    }
}
