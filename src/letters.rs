use std::ops::RangeInclusive;

// Character-set constants
pub(crate) const ALPHABET_SIZE: usize = 26;
pub(crate) const LOWERCASE_ALPHABET: RangeInclusive<char> = 'a'..='z';

pub(crate) trait GridChar {
    fn is_letter(&self) -> bool;
    fn letter_index(&self) -> Option<usize>;
}

impl GridChar for char {
    fn is_letter(&self) -> bool {
        LOWERCASE_ALPHABET.contains(self)
    }

    // 'a' -> 0, 'b' -> 1, ..., 'z' -> 25
    fn letter_index(&self) -> Option<usize> {
        if self.is_letter() {
            Some(*self as usize - 'a' as usize)
        } else {
            None
        }
    }
}

/// Frequency count of the letters `a..=z` in a word or on a board.
///
/// Used by the trie's feasibility filter: a dictionary word can only ever be
/// extracted from a board if its letters form a sub-multiset of the board's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LetterCounts {
    counts: [u32; ALPHABET_SIZE],
    len: usize,
}

impl LetterCounts {
    /// Count the letters in `chars`.
    ///
    /// Returns `None` if any character is outside `a..=z`; such a sequence can
    /// never be spelled on a board.
    pub fn of_chars<I: IntoIterator<Item = char>>(chars: I) -> Option<Self> {
        let mut counts = [0u32; ALPHABET_SIZE];
        let mut len = 0;
        for c in chars {
            let slot = &mut counts[c.letter_index()?];
            *slot = slot.saturating_add(1);
            len += 1;
        }
        Some(LetterCounts { counts, len })
    }

    /// Count the letters of `word`.
    pub fn of_word(word: &str) -> Option<Self> {
        Self::of_chars(word.chars())
    }

    pub fn count(&self, c: char) -> u32 {
        c.letter_index().map_or(0, |i| self.counts[i])
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True if every letter occurs in `self` at most as often as in `other`.
    pub fn is_sub_multiset_of(&self, other: &LetterCounts) -> bool {
        self.len <= other.len
            && self.counts.iter().zip(other.counts.iter()).all(|(mine, theirs)| mine <= theirs)
    }
}
