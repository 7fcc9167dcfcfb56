//! Feedback shared between the search workers and whoever tries words on
//! the live game.
//!
//! Three key sets, each safe to touch from any thread:
//! - **bad**: words the game rejected; any state containing one is pruned.
//! - **seen**: words already proposed as speculative tests and not yet yielded.
//! - **tested**: words already tried on the game; never proposed again.
//!
//! Operations are atomic per key only. A worker can check a word, find it
//! clean, and have it marked bad a moment later, so consumers re-check
//! before acting on anything they receive.

use dashmap::DashSet;

#[derive(Debug, Default)]
pub struct Feedback {
    bad: DashSet<String>,
    seen: DashSet<String>,
    tested: DashSet<String>,
}

impl Feedback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the game rejected `word`.
    pub fn mark_bad_word(&self, word: &str) {
        self.bad.insert(word.to_string());
    }

    /// Record that `word` has been tried on the game.
    pub fn mark_tested_word(&self, word: &str) {
        self.tested.insert(word.to_string());
    }

    pub fn is_bad(&self, word: &str) -> bool {
        self.bad.contains(word)
    }

    pub fn is_tested(&self, word: &str) -> bool {
        self.tested.contains(word)
    }

    pub fn is_seen(&self, word: &str) -> bool {
        self.seen.contains(word)
    }

    /// True if any of `words` has been marked bad.
    pub fn any_bad<'a, I: IntoIterator<Item = &'a str>>(&self, words: I) -> bool {
        words.into_iter().any(|w| self.is_bad(w))
    }

    /// Mark `word` as proposed unless it is already seen or tested.
    ///
    /// Returns `true` if this call claimed the word.
    pub(crate) fn claim_for_test(&self, word: &str) -> bool {
        !self.is_tested(word) && !self.is_seen(word) && self.seen.insert(word.to_string())
    }

    /// Forget that `word` was proposed. Returns `true` if it was.
    pub(crate) fn release_seen(&self, word: &str) -> bool {
        self.seen.remove(word).is_some()
    }

    /// All bad words, sorted.
    pub fn bad_words(&self) -> Vec<String> {
        let mut words: Vec<String> = self.bad.iter().map(|w| w.key().clone()).collect();
        words.sort();
        words
    }

    pub fn bad_count(&self) -> usize {
        self.bad.len()
    }

    /// Forget everything; used between levels.
    pub fn clear(&self) {
        self.bad.clear();
        self.seen.clear();
        self.tested.clear();
    }
}
