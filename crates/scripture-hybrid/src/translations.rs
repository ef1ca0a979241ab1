use anyhow::Result;
use std::collections::BTreeSet;

use scripture_core::traits::VerseStore;

/// Translation tags seen during import.
#[derive(Debug, Clone, Default)]
pub struct TranslationRegistry {
    tags: BTreeSet<String>,
}

impl TranslationRegistry {
    pub fn record(&mut self, tag: impl Into<String>) {
        self.tags.insert(tag.into());
    }

    pub fn is_empty(&self) -> bool { self.tags.is_empty() }

    /// Sorted tags. An empty registry is filled from the store's books first.
    pub fn list(&mut self, store: &dyn VerseStore) -> Result<Vec<String>> {
        if self.tags.is_empty() {
            self.tags = store.translations()?.into_iter().collect();
        }
        Ok(self.tags.iter().cloned().collect())
    }
}
