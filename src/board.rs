//! Board states: one snapshot of a search branch.
//!
//! A [`BoardState`] holds the letters still on the board, the word lengths
//! still required, and the [`Step`]s (word + path + board snapshot) taken from
//! the starting board to reach it. States are never mutated once built:
//! [`BoardState::derive_child`] returns a fresh state with its own cell buffer.
//!
//! Cells are indexed row-major on a `side × side` grid. Consumed cells become
//! `None`. With [`Settle::Gravity`] the remaining letters then fall down their
//! column, the way the game settles the board, so the indices of a later word
//! refer to the board *after* the earlier words were removed. Each `Step`
//! therefore keeps the board it was taken from.

use crate::puzzle::Puzzle;
use crate::trie::{NodeId, Trie};
use std::fmt;
use std::sync::Arc;

/// A board cell: a letter, or `None` once it has been used by a word.
pub type Cell = Option<char>;

/// An ordered sequence of distinct, grid-adjacent cell indices.
pub type Path = Vec<usize>;

/// Offsets (row, column) of the eight neighbours of a cell.
const DIRECTIONS: [(isize, isize); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1),           (0, 1),
    (1, -1),  (1, 0),  (1, 1),
];

/// What happens to the remaining letters after a word is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Settle {
    /// Letters above an emptied cell fall down their column.
    #[default]
    Gravity,
    /// Emptied cells stay empty; nothing moves.
    InPlace,
}

/// A candidate starting cell for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Root {
    pub index: usize,
    pub letter: char,
}

/// One word taken off the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// The word spelled by `path`.
    pub word: String,
    /// Cell indices into `board`, in spelling order.
    pub path: Path,
    /// The board as it was when the word was taken.
    pub board: Arc<[Cell]>,
}

impl Step {
    /// Resolve the path's letters against the board the step was taken from.
    pub fn spelled(&self) -> String {
        self.path.iter().filter_map(|&i| self.board.get(i).copied().flatten()).collect()
    }
}

#[derive(Debug, Clone)]
pub struct BoardState {
    cells: Arc<[Cell]>,
    side: usize,
    /// Sorted ascending.
    remaining_lengths: Vec<usize>,
    steps: Vec<Arc<Step>>,
    settle: Settle,
}

impl BoardState {
    /// The starting state of a puzzle: every cell occupied, nothing found yet.
    pub fn from_puzzle(puzzle: &Puzzle, settle: Settle) -> Self {
        let mut remaining_lengths = puzzle.word_lengths().to_vec();
        remaining_lengths.sort_unstable();

        BoardState {
            cells: puzzle.letters().iter().copied().map(Some).collect(),
            side: puzzle.side(),
            remaining_lengths,
            steps: Vec::new(),
            settle,
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn settle(&self) -> Settle {
        self.settle
    }

    /// Word lengths still required, ascending.
    pub fn remaining_lengths(&self) -> &[usize] {
        &self.remaining_lengths
    }

    /// Number of letters still on the board.
    pub fn remaining_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// A state with no lengths left to fill is a complete solution.
    pub fn is_solution(&self) -> bool {
        self.remaining_lengths.is_empty()
    }

    pub fn steps(&self) -> &[Arc<Step>] {
        &self.steps
    }

    /// Words found along this branch, in the order they were taken.
    pub fn words(&self) -> impl Iterator<Item = &str> + '_ {
        self.steps.iter().map(|step| step.word.as_str())
    }

    /// Paths of the found words, each relative to the board of its own step.
    pub fn paths(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.steps.iter().map(|step| step.path.as_slice())
    }

    /// Letters of step `i`'s path, read from the board that step was taken from.
    pub fn letters_for_step(&self, i: usize) -> Option<String> {
        self.steps.get(i).map(|step| step.spelled())
    }

    pub fn contains_word(&self, word: &str) -> bool {
        self.words().any(|w| w == word)
    }

    /// One root per occupied cell.
    pub fn path_roots(&self) -> Vec<Root> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(index, cell)| cell.map(|letter| Root { index, letter }))
            .collect()
    }

    /// Roots whose letter starts at least one word in `trie`.
    pub fn valid_roots(&self, trie: &Trie) -> Vec<Root> {
        self.path_roots()
            .into_iter()
            .filter(|root| trie.step(Trie::ROOT, root.letter).is_some())
            .collect()
    }

    /// Lazily enumerate the paths from `root` that spell a trie word whose
    /// length is still required.
    pub fn valid_paths<'a>(&'a self, root: Root, trie: &'a Trie) -> PathIter<'a> {
        let max_len = self.remaining_lengths.last().copied().unwrap_or(0);
        PathIter::new(self, root, trie, max_len, true)
    }

    /// The longest trie word reachable from `root`, regardless of the word
    /// lengths still required. Ties go to the path found first.
    pub fn longest_path(&self, root: Root, trie: &Trie) -> Option<Path> {
        PathIter::new(self, root, trie, self.remaining_cells(), false).fold(None, |best, path| {
            match best {
                Some(best) if best.len() >= path.len() => Some(best),
                _ => Some(path),
            }
        })
    }

    /// The letters at `path`'s indices on the current board.
    pub fn word_for(&self, path: &[usize]) -> String {
        path.iter().filter_map(|&i| self.cells.get(i).copied().flatten()).collect()
    }

    /// A new state with `path`'s cells removed, one instance of `path.len()`
    /// removed from the remaining lengths, and the word recorded as a new step.
    ///
    /// `path` must come from [`BoardState::valid_paths`] on this state.
    pub fn derive_child(&self, path: &[usize]) -> BoardState {
        debug_assert!(
            self.remaining_lengths.contains(&path.len()),
            "path length {} is not among the remaining lengths {:?}",
            path.len(),
            self.remaining_lengths
        );

        let word = self.word_for(path);
        debug_assert_eq!(word.chars().count(), path.len(), "path crosses an empty cell");

        let mut cells: Vec<Cell> = self.cells.to_vec();
        for &i in path {
            cells[i] = None;
        }
        if self.settle == Settle::Gravity {
            drop_letters(&mut cells, self.side);
        }

        let mut remaining_lengths = self.remaining_lengths.clone();
        if let Some(pos) = remaining_lengths.iter().position(|&len| len == path.len()) {
            remaining_lengths.remove(pos);
        }

        let mut steps = self.steps.clone();
        steps.push(Arc::new(Step { word, path: path.to_vec(), board: Arc::clone(&self.cells) }));

        BoardState {
            cells: cells.into(),
            side: self.side,
            remaining_lengths,
            steps,
            settle: self.settle,
        }
    }

    /// Key identifying structurally identical boards reached by different
    /// word orders.
    pub fn canonical_key(&self) -> Arc<[Cell]> {
        Arc::clone(&self.cells)
    }

    /// Occupied-or-not neighbours of `index`, in row-major order.
    pub fn neighbours(&self, index: usize) -> impl DoubleEndedIterator<Item = usize> + '_ {
        let side = self.side as isize;
        let row = (index / self.side) as isize;
        let col = (index % self.side) as isize;
        DIRECTIONS.iter().filter_map(move |&(dr, dc)| {
            let (r, c) = (row + dr, col + dc);
            if (0..side).contains(&r) && (0..side).contains(&c) {
                Some((r * side + c) as usize)
            } else {
                None
            }
        })
    }

    /// True if `a` and `b` touch horizontally, vertically or diagonally.
    pub fn are_adjacent(&self, a: usize, b: usize) -> bool {
        a != b && self.neighbours(a).any(|n| n == b)
    }
}

/// Let the letters of every column fall to the lowest empty cells.
fn drop_letters(cells: &mut [Cell], side: usize) {
    for col in 0..side {
        let mut write_row = side;
        for row in (0..side).rev() {
            if let Some(letter) = cells[row * side + col] {
                write_row -= 1;
                cells[row * side + col] = None;
                cells[write_row * side + col] = Some(letter);
            }
        }
    }
}

impl fmt::Display for BoardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.side) {
            let line: String = row.iter().map(|cell| cell.unwrap_or('.')).collect();
            writeln!(f, "{line}")?;
        }
        let words: Vec<&str> = self.words().collect();
        write!(f, "words: {words:?} remaining: {:?}", self.remaining_lengths)
    }
}

/// Depth-first walk over grid-adjacent unused cells, advancing a trie cursor
/// alongside. Branches die as soon as the trie has no edge for the next letter
/// or the path would exceed `max_len`.
pub struct PathIter<'a> {
    board: &'a BoardState,
    trie: &'a Trie,
    max_len: usize,
    /// Only yield paths whose length is still required.
    require_remaining: bool,
    stack: Vec<(Path, NodeId)>,
}

impl<'a> PathIter<'a> {
    fn new(board: &'a BoardState, root: Root, trie: &'a Trie, max_len: usize, require_remaining: bool) -> Self {
        let mut stack = Vec::new();
        let occupied = board.cells.get(root.index).copied().flatten();
        if max_len > 0 && occupied == Some(root.letter) {
            if let Some(node) = trie.step(Trie::ROOT, root.letter) {
                stack.push((vec![root.index], node));
            }
        }
        PathIter { board, trie, max_len, require_remaining, stack }
    }
}

impl Iterator for PathIter<'_> {
    type Item = Path;

    fn next(&mut self) -> Option<Path> {
        while let Some((path, node)) = self.stack.pop() {
            if path.len() < self.max_len {
                if let Some(&last) = path.last() {
                    // reversed so that lower indices are popped first
                    for n in self.board.neighbours(last).rev() {
                        if path.contains(&n) {
                            continue;
                        }
                        let Some(letter) = self.board.cells[n] else { continue };
                        let Some(next) = self.trie.step(node, letter) else { continue };
                        let mut extended = Vec::with_capacity(path.len() + 1);
                        extended.extend_from_slice(&path);
                        extended.push(n);
                        self.stack.push((extended, next));
                    }
                }
            }

            if self.trie.is_terminal(node)
                && (!self.require_remaining || self.board.remaining_lengths.contains(&path.len()))
            {
                return Some(path);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(letters: &str, lengths: &[usize], settle: Settle) -> BoardState {
        BoardState::from_puzzle(&Puzzle::from_parts(letters, lengths).unwrap(), settle)
    }

    fn trie(words: &[&str]) -> Trie {
        words.iter().copied().collect()
    }

    #[test]
    fn test_roots() {
        let board = state("abcd", &[2, 2], Settle::Gravity);
        assert_eq!(board.path_roots().len(), 4);
        let roots = board.valid_roots(&trie(&["ab", "cd"]));
        assert_eq!(roots, vec![Root { index: 0, letter: 'a' }, Root { index: 2, letter: 'c' }]);
    }

    #[test]
    fn test_neighbours_corner_and_centre() {
        let board = state("abcdefghi", &[9], Settle::Gravity);
        assert_eq!(board.neighbours(0).collect::<Vec<_>>(), vec![1, 3, 4]);
        assert_eq!(board.neighbours(4).collect::<Vec<_>>(), vec![0, 1, 2, 3, 5, 6, 7, 8]);
        assert_eq!(board.neighbours(8).collect::<Vec<_>>(), vec![4, 5, 7]);
        assert!(board.are_adjacent(0, 4));
        assert!(!board.are_adjacent(0, 2));
        assert!(!board.are_adjacent(4, 4));
    }

    #[test]
    fn test_valid_paths_respects_remaining_lengths() {
        // a b c
        // d e f
        // g h i
        let board = state("abcdefghi", &[3, 6], Settle::Gravity);
        let t = trie(&["abc", "ab", "abcfed", "aei"]);
        let root = Root { index: 0, letter: 'a' };
        let words: Vec<String> = board.valid_paths(root, &t).map(|p| board.word_for(&p)).collect();
        assert!(words.contains(&"abc".to_string()));
        assert!(words.contains(&"aei".to_string()));
        assert!(words.contains(&"abcfed".to_string()));
        assert!(!words.contains(&"ab".to_string()));
    }

    #[test]
    fn test_valid_paths_are_adjacent_and_distinct() {
        let board = state("ababababa", &[4, 5], Settle::InPlace);
        let t = trie(&["abab", "ababa"]);
        let mut count = 0;
        for root in board.valid_roots(&t) {
            for path in board.valid_paths(root, &t) {
                count += 1;
                let mut seen = std::collections::HashSet::new();
                assert!(path.iter().all(|i| seen.insert(*i)), "repeated cell in {path:?}");
                assert!(path.windows(2).all(|w| board.are_adjacent(w[0], w[1])));
                assert!(board.remaining_lengths().contains(&path.len()));
            }
        }
        assert!(count > 0);
    }

    #[test]
    fn test_valid_paths_stop_at_max_length() {
        let board = state("aaaa", &[2, 2], Settle::Gravity);
        let t = trie(&["aa", "aaa"]);
        let root = Root { index: 0, letter: 'a' };
        let paths: Vec<Path> = board.valid_paths(root, &t).collect();
        // one two-letter path to each of the three neighbours
        assert_eq!(paths.len(), 3);
        assert!(paths.iter().all(|p| p.len() == 2));
    }

    #[test]
    fn test_derive_child_in_place() {
        let board = state("abcd", &[2, 2], Settle::InPlace);
        let child = board.derive_child(&[0, 3]);
        assert_eq!(child.cells(), &[None, Some('b'), Some('c'), None]);
        assert_eq!(child.remaining_lengths(), &[2]);
        assert_eq!(child.words().collect::<Vec<_>>(), vec!["ad"]);
        // the parent is untouched
        assert_eq!(board.remaining_cells(), 4);
        assert!(board.steps().is_empty());
    }

    #[test]
    fn test_derive_child_gravity() {
        // a b
        // c d
        let board = state("abcd", &[2, 2], Settle::Gravity);
        let child = board.derive_child(&[2, 3]);
        assert_eq!(child.cells(), &[None, None, Some('a'), Some('b')]);
        assert_eq!(child.steps()[0].word, "cd");
        assert_eq!(child.steps()[0].spelled(), "cd");
        assert_eq!(child.word_for(&[2, 3]), "ab");
    }

    #[test]
    fn test_gravity_three_by_three() {
        // c a t
        // d o g
        // x y z
        let board = state("catdogxyz", &[3, 3, 3], Settle::Gravity);
        let child = board.derive_child(&[3, 4, 5]);
        let rendered: String = child.cells().iter().map(|c| c.unwrap_or('.')).collect();
        assert_eq!(rendered, "...catxyz");
    }

    #[test]
    fn test_derive_child_keeps_cell_invariant() {
        let board = state("catdogxyz", &[3, 3, 3], Settle::Gravity);
        let t = trie(&["cat", "dog", "xyz", "cod", "toy"]);
        for root in board.valid_roots(&t) {
            for path in board.valid_paths(root, &t) {
                let child = board.derive_child(&path);
                let found: usize = child.words().map(str::len).sum();
                assert_eq!(child.remaining_cells() + found, 9);
                assert_eq!(child.remaining_cells(), child.remaining_lengths().iter().sum::<usize>());
            }
        }
    }

    #[test]
    fn test_steps_resolve_against_their_own_board() {
        let board = state("catdogxyz", &[3, 3, 3], Settle::Gravity);
        let first = board.derive_child(&[3, 4, 5]); // dog
        let second = first.derive_child(&[3, 4, 5]); // cat, fallen to the middle row
        let steps = second.steps();
        assert_eq!(steps[0].spelled(), "dog");
        assert_eq!(steps[1].spelled(), "cat");
        assert_eq!(second.letters_for_step(1).as_deref(), Some("cat"));
        assert_eq!(second.letters_for_step(2), None);
        let expected: Vec<&[usize]> = vec![&[3, 4, 5], &[3, 4, 5]];
        assert_eq!(second.paths().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_canonical_key_matches_for_different_orders() {
        let board = state("abcd", &[1, 1, 2], Settle::InPlace);
        let ab = board.derive_child(&[0]).derive_child(&[1]);
        let ba = board.derive_child(&[1]).derive_child(&[0]);
        assert_eq!(ab.canonical_key(), ba.canonical_key());
        assert_ne!(ab.words().collect::<Vec<_>>(), ba.words().collect::<Vec<_>>());
    }

    #[test]
    fn test_solution_state() {
        let board = state("abcd", &[4], Settle::Gravity);
        let t = trie(&["abdc"]);
        let root = board.valid_roots(&t)[0];
        let path = board.valid_paths(root, &t).next().unwrap();
        let child = board.derive_child(&path);
        assert!(child.is_solution());
        assert_eq!(child.remaining_cells(), 0);
    }

    #[test]
    fn test_longest_path_ignores_remaining_lengths() {
        let board = state("abcdefghi", &[3, 3, 3], Settle::Gravity);
        let t = trie(&["ab", "abc", "abcfed"]);
        let root = Root { index: 0, letter: 'a' };
        let path = board.longest_path(root, &t).unwrap();
        assert_eq!(board.word_for(&path), "abcfed");
        assert!(board.longest_path(Root { index: 8, letter: 'i' }, &t).is_none());
    }

    #[test]
    fn test_display() {
        let board = state("abcd", &[2, 2], Settle::InPlace).derive_child(&[0, 1]);
        let shown = board.to_string();
        assert!(shown.starts_with("..\ncd\n"));
        assert!(shown.contains("\"ab\""));
    }
}
