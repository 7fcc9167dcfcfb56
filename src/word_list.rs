//! `word_list`: the word source the trie is built from.
//!
//! The dictionary is a newline-delimited list of words, usually scraped from
//! published level solutions. It is read once per puzzle when the trie is built.
//!
//! The parsing logic:
//! - Each line holds one word. An optional `;score` suffix (as found in scored
//!   word lists) is ignored.
//! - Words are trimmed and normalized to lowercase.
//! - Lines that are empty, or whose word contains anything but `a..=z`, are skipped
//!   silently. Such words could never be spelled on a board.
//! - The final list is deduplicated and sorted by length first, then alphabetically.

use crate::letters::GridChar;

/// Struct representing a processed, ready-to-use word list.
#[derive(Debug, Clone, Default)]
pub struct WordList {
    /// List of lowercase words, sorted by (length, alphabetical).
    pub words: Vec<String>,
}

impl WordList {
    /// Parse a raw word list from an in-memory string.
    pub fn parse_from_str(contents: &str) -> WordList {
        let mut words: Vec<String> = contents
            .lines()
            .filter_map(|raw_line| {
                let line = raw_line.trim();
                let word = match line.split_once(';') {
                    Some((word, _score)) => word.trim(),
                    None => line,
                };

                if word.is_empty() {
                    return None;
                }

                let word = word.to_lowercase();
                if word.chars().all(|c| c.is_letter()) {
                    Some(word)
                } else {
                    None
                }
            })
            .collect();

        // `dedup` only removes adjacent duplicates, so sort alphabetically first
        words.sort();
        words.dedup();
        words.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

        WordList { words }
    }

    /// Read from a file path and parse.
    ///
    /// # Errors
    ///
    /// Will return an `Error` if unable to read a file at `path`.
    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> std::io::Result<WordList> {
        let path_ref = path.as_ref();

        let data = std::fs::read_to_string(path_ref).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("failed to read word list from '{}': {}", path_ref.display(), e),
            )
        })?;

        Ok(Self::parse_from_str(&data))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}
