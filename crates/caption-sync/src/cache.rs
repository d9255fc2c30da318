use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

pub type SharedCache = Rc<RefCell<TranslationCache>>;

/// Session-scoped map from merged sentence text to its translation, plus the
/// set of sentences currently being translated.
#[derive(Debug, Default)]
pub struct TranslationCache {
    entries: HashMap<String, String>,
    pending: HashSet<String>,
}

impl TranslationCache {
    pub fn shared() -> SharedCache {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn get(&self, text: &str) -> Option<&str> {
        self.entries.get(text).map(String::as_str)
    }

    /// Claims `text` for translation. Returns `false` when it is already cached
    /// or another caller claimed it first.
    pub fn begin(&mut self, text: &str) -> bool {
        if self.entries.contains_key(text) || self.pending.contains(text) {
            return false;
        }
        self.pending.insert(text.to_string());
        true
    }

    pub fn is_pending(&self, text: &str) -> bool {
        self.pending.contains(text)
    }

    pub fn insert(&mut self, text: &str, translation: &str) {
        self.pending.remove(text);
        self.entries
            .insert(text.to_string(), translation.to_string());
    }

    /// Releases a claim after a failed call so a later pass can retry.
    pub fn abandon(&mut self, text: &str) {
        self.pending.remove(text);
    }

    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
