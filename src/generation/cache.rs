// file: src/generation/cache.rs
// description: per-session summary cache keyed by document source
// reference: internal module structure

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct SummaryCache {
    entries: HashMap<String, String>,
}

impl SummaryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, document_key: &str) -> Option<&str> {
        self.entries.get(document_key).map(String::as_str)
    }

    pub fn insert(&mut self, document_key: impl Into<String>, summary: impl Into<String>) {
        self.entries.insert(document_key.into(), summary.into());
    }

    pub fn contains(&self, document_key: &str) -> bool {
        self.entries.contains_key(document_key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
