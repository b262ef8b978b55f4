use crate::storage::{Storage, StorageKey};

const MAX_HISTORY: usize = 10;

/// Recent search queries, newest first, unique, at most ten.
pub struct SearchHistory {
    storage: Storage,
    entries: Vec<String>,
}

impl SearchHistory {
    pub fn load(storage: Storage) -> Self {
        let mut entries: Vec<String> = storage.load_or_default(&StorageKey::SearchHistory);
        entries.truncate(MAX_HISTORY);
        Self { storage, entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Records a query. Blank input is ignored and returns `false`.
    pub fn record(&mut self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return false;
        }
        self.entries.retain(|entry| entry != query);
        self.entries.insert(0, query.to_string());
        self.entries.truncate(MAX_HISTORY);
        self.persist();
        true
    }

    pub fn remove(&mut self, query: &str) {
        let before = self.entries.len();
        self.entries.retain(|entry| entry != query);
        if self.entries.len() != before {
            self.persist();
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        if let Err(e) = self.storage.remove(&StorageKey::SearchHistory) {
            log::error!("failed to clear search history: {e}");
        }
    }

    fn persist(&self) {
        self.storage
            .save_logged(&StorageKey::SearchHistory, &self.entries);
    }
}
