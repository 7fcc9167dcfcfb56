//! Integration tests for the WordBrain solver.
//!
//! These tests run the whole pipeline: word list loading, trie filtering,
//! parallel search and feedback, against the fixture word list.

use std::collections::BTreeSet;

use wordbrain::board::{BoardState, Settle};
use wordbrain::puzzle::Puzzle;
use wordbrain::solver::{Candidate, Search, Solver, SolverConfig, SolverError};
use wordbrain::trie::Trie;
use wordbrain::word_list::WordList;
use wordbrain::errors::PuzzleError;

/// Load the test word list from fixtures
fn load_test_word_list() -> WordList {
    WordList::load_from_path("tests/fixtures/test_word_list.txt").expect("Failed to read test word list")
}

fn one_worker() -> SolverConfig {
    SolverConfig { workers: Some(1), ..SolverConfig::default() }
}

/// Helper to collect the word sequences of every yielded solution
fn solution_words(search: Search) -> BTreeSet<Vec<String>> {
    search
        .filter(Candidate::is_solution)
        .map(|candidate| candidate.state().words().map(String::from).collect())
        .collect()
}

fn expected(sets: &[&[&str]]) -> BTreeSet<Vec<String>> {
    sets.iter().map(|words| words.iter().map(|w| w.to_string()).collect()).collect()
}

#[cfg(test)]
mod word_source {
    use super::*;

    #[test]
    fn test_fixture_is_cleaned() {
        let word_list = load_test_word_list();
        assert_eq!(word_list.len(), 22);
        assert!(word_list.words.contains(&"cat".to_string()));
        assert!(!word_list.words.iter().any(|w| w.contains(' ') || w.contains('\'')));
        // sorted by length first
        assert!(word_list.words.windows(2).all(|w| w[0].len() <= w[1].len()));
    }

    #[test]
    fn test_feasibility_filter() {
        let word_list = load_test_word_list();
        let puzzle: Puzzle = "catdogsun:3,3,3".parse().unwrap();
        let (trie, added) = Solver::build_trie(puzzle.letters(), puzzle.word_lengths(), word_list.iter());

        assert_eq!(added, 15);
        assert!(trie.contains("cat"));
        assert!(trie.contains("gnu"));
        assert!(!trie.contains("add"), "needs two d's");
        assert!(!trie.contains("cats"), "no 4-letter word requested");
        assert!(!trie.contains("ab"), "no 2-letter word requested");
    }

    #[test]
    fn test_filtered_words_never_appear_in_solutions() {
        let word_list = load_test_word_list();
        let puzzle: Puzzle = "catdogsun:3,3,3".parse().unwrap();
        let mut solver = Solver::new(SolverConfig::default());
        for words in solution_words(solver.solve(&puzzle, word_list.iter()).unwrap()) {
            assert!(words.iter().all(|w| w.len() == 3));
            assert!(!words.contains(&"add".to_string()));
        }
    }
}

#[cfg(test)]
mod solutions {
    use super::*;

    #[test]
    fn test_two_by_two_exact_set() {
        let puzzle: Puzzle = "abcd:2,2".parse().unwrap();
        let mut solver = Solver::new(one_worker());
        let found = solution_words(solver.solve(&puzzle, ["ab", "cd", "ac", "bd"]).unwrap());

        assert_eq!(
            found,
            expected(&[&["ab", "cd"], &["cd", "ab"], &["ac", "bd"], &["bd", "ac"]])
        );
    }

    #[test]
    fn test_rows_in_any_order() {
        // c a t
        // d o g
        // s u n
        let puzzle: Puzzle = "catdogsun:3,3,3".parse().unwrap();
        for settle in [Settle::Gravity, Settle::InPlace] {
            let mut solver = Solver::new(SolverConfig { settle, ..one_worker() });
            let found = solution_words(solver.solve(&puzzle, ["cat", "dog", "sun"]).unwrap());
            assert_eq!(
                found,
                expected(&[
                    &["cat", "dog", "sun"],
                    &["cat", "sun", "dog"],
                    &["dog", "cat", "sun"],
                    &["dog", "sun", "cat"],
                    &["sun", "cat", "dog"],
                    &["sun", "dog", "cat"],
                ]),
                "unexpected solutions with {settle:?}"
            );
        }
    }

    #[test]
    fn test_every_solution_uses_every_letter() {
        let word_list = load_test_word_list();
        let puzzle: Puzzle = "catdogsun:3,3,3".parse().unwrap();
        let mut solver = Solver::new(SolverConfig::default());
        let search = solver.solve(&puzzle, word_list.iter()).unwrap();

        let mut count = 0;
        for candidate in search.filter(Candidate::is_solution) {
            let state = candidate.state();
            assert!(state.is_solution());
            assert!(state.remaining_lengths().is_empty());
            assert_eq!(state.words().map(str::len).sum::<usize>(), puzzle.len());
            count += 1;
        }
        assert!(count >= 6, "expected at least the row solutions, got {count}");
    }

    #[test]
    fn test_paths_resolve_against_step_boards() {
        let word_list = load_test_word_list();
        let puzzle: Puzzle = "catdogsun:3,3,3".parse().unwrap();
        let mut solver = Solver::new(SolverConfig::default());
        let search = solver.solve(&puzzle, word_list.iter()).unwrap();

        for candidate in search {
            let state = candidate.state();
            for (i, step) in state.steps().iter().enumerate() {
                assert_eq!(state.letters_for_step(i).as_deref(), Some(step.word.as_str()));
                let mut seen = BTreeSet::new();
                assert!(step.path.iter().all(|&c| seen.insert(c)), "repeated cell in {:?}", step.path);
                let board = BoardState::from_puzzle(&puzzle, Settle::InPlace);
                assert!(
                    step.path.windows(2).all(|w| board.are_adjacent(w[0], w[1])),
                    "non-adjacent cells in {:?}",
                    step.path
                );
            }
        }
    }

    #[test]
    fn test_solution_set_is_deterministic() {
        let word_list = load_test_word_list();
        let puzzle: Puzzle = "catdogsun:3,3,3".parse().unwrap();

        let mut first = Solver::new(one_worker());
        let mut second = Solver::new(one_worker());
        let mut many = Solver::new(SolverConfig { workers: Some(4), ..SolverConfig::default() });

        let a = solution_words(first.solve(&puzzle, word_list.iter()).unwrap());
        let b = solution_words(second.solve(&puzzle, word_list.iter()).unwrap());
        let c = solution_words(many.solve(&puzzle, word_list.iter()).unwrap());
        assert_eq!(a, b);
        assert_eq!(a, c, "worker count must not change the solution set");
    }

    #[test]
    fn test_no_solution() {
        let puzzle: Puzzle = "catdogsun:3,3,3".parse().unwrap();
        let mut solver = Solver::new(SolverConfig::default());
        let search = solver.solve(&puzzle, ["cat", "dog"]).unwrap();
        assert!(solution_words(search).is_empty());
    }
}

#[cfg(test)]
mod feedback {
    use super::*;

    #[test]
    fn test_bad_word_before_search() {
        let puzzle: Puzzle = "catdogsun:3,3,3".parse().unwrap();
        let mut solver = Solver::new(one_worker());
        solver.mark_bad_word("dog");
        let found = solution_words(solver.solve(&puzzle, ["cat", "dog", "sun"]).unwrap());
        assert!(found.is_empty());
    }

    #[test]
    fn test_bad_word_during_search() {
        let word_list = load_test_word_list();
        let puzzle: Puzzle = "catdogsun:3,3,3".parse().unwrap();
        let mut solver = Solver::new(SolverConfig::default());
        let mut search = solver.solve(&puzzle, word_list.iter()).unwrap();

        let first = search.by_ref().find(Candidate::is_solution).unwrap();
        let rejected = first.state().words().next().unwrap().to_string();
        solver.mark_bad_word(&rejected);

        for candidate in search {
            assert!(
                !candidate.state().contains_word(&rejected),
                "{rejected} was marked bad but still yielded"
            );
        }
    }

    #[test]
    fn test_speculative_tests_respect_tested_words() {
        let word_list = load_test_word_list();
        let puzzle: Puzzle = "catdogsun:3,3,3".parse().unwrap();
        let mut solver = Solver::new(SolverConfig { seen_threshold: 0, ..one_worker() });
        let mut search = solver.solve(&puzzle, word_list.iter()).unwrap();

        let first_test = search.by_ref().find_map(|candidate| match candidate {
            Candidate::Test { word, state } => Some((word, state)),
            Candidate::Solution(_) => None,
        });
        let (word, state) = first_test.expect("a zero threshold must propose words");
        assert!(state.contains_word(&word));
        assert!(!state.is_solution());
        solver.mark_tested_word(&word);

        for candidate in search {
            if let Candidate::Test { word: proposed, .. } = candidate {
                assert_ne!(proposed, word, "tested word proposed again");
            }
        }
    }

    #[test]
    fn test_default_threshold_proposes_nothing_on_small_boards() {
        let word_list = load_test_word_list();
        let puzzle: Puzzle = "catdogsun:3,3,3".parse().unwrap();
        let mut solver = Solver::new(SolverConfig::default());
        let search = solver.solve(&puzzle, word_list.iter()).unwrap();
        assert!(search.into_iter().all(|c| c.is_solution()));
    }

    #[test]
    fn test_early_drop() {
        let word_list = load_test_word_list();
        let puzzle: Puzzle = "catdogsun:3,3,3".parse().unwrap();
        let mut solver = Solver::new(SolverConfig { workers: Some(4), ..SolverConfig::default() });
        let mut search = solver.solve(&puzzle, word_list.iter()).unwrap();
        assert!(search.next().is_some());
        drop(search);

        // the solver is reusable once the previous search is gone
        let again = solution_words(solver.solve(&puzzle, ["cat", "dog", "sun"]).unwrap());
        assert_eq!(again.len(), 6);
    }

    #[test]
    fn test_search_stats() {
        let puzzle: Puzzle = "catdogsun:3,3,3".parse().unwrap();
        let mut solver = Solver::new(one_worker());
        let mut search = solver.solve(&puzzle, ["cat", "dog", "sun"]).unwrap();
        let yielded = search.by_ref().count();
        assert_eq!(yielded, 6);
        assert_eq!(search.solutions_yielded(), 6);
        assert_eq!(search.tests_yielded(), 0);
        assert!(search.failed_workers().is_empty());
        assert_eq!(search.active_workers(), 0);
        assert!(search.stats().expanded > 0);
    }
}

#[cfg(test)]
mod persisted_trie {
    use super::*;

    #[test]
    fn test_saved_trie_solves_like_word_list() {
        let word_list = load_test_word_list();
        let puzzle: Puzzle = "catdogsun:3,3,3".parse().unwrap();
        let path = std::env::temp_dir().join(format!("wordbrain-it-{}.trie", std::process::id()));

        let trie: Trie = word_list.iter().collect();
        trie.save(&path).unwrap();
        let loaded = Trie::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.len(), word_list.len());

        let mut from_trie = Solver::new(one_worker());
        from_trie.initialize(loaded);
        let a = solution_words(from_trie.search(from_trie.root_state(&puzzle)).unwrap());

        let mut from_list = Solver::new(one_worker());
        let b = solution_words(from_list.solve(&puzzle, word_list.iter()).unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn test_longest_path_per_root() {
        let trie: Trie = load_test_word_list().iter().collect();
        // t o a
        // x d x
        // x x x
        let puzzle = Puzzle::from_parts("toaxdxxxx", &[9]).unwrap();
        let board = BoardState::from_puzzle(&puzzle, Settle::InPlace);

        let roots = board.path_roots();
        let path = board.longest_path(roots[0], &trie).unwrap();
        assert_eq!(board.word_for(&path), "toad");
        assert!(board.longest_path(roots[8], &trie).is_none());
    }

    #[test]
    fn test_missing_trie_is_an_error() {
        let err = SolverError::from(Trie::load("/nonexistent/wordbrain.trie").unwrap_err());
        assert_eq!(err.code(), "S003");
    }
}

#[cfg(test)]
mod errors {
    use super::*;

    #[test]
    fn test_invalid_puzzles() {
        let cases: &[(&str, &str)] = &[
            ("abcde:5", "P003"),
            ("abc:3", "P005"),
            ("abcd:3", "P004"),
            ("ab1d:4", "P006"),
        ];
        for (raw, code) in cases {
            let err = raw.parse::<Puzzle>().unwrap_err();
            assert_eq!(err.code(), *code, "wrong code for {raw}: {err}");
        }
    }

    #[test]
    fn test_solve_grid_rejects_bad_input() {
        let mut solver = Solver::new(SolverConfig::default());
        let letters: Vec<char> = "abcd".chars().collect();
        let err = solver.solve_grid(&letters, &[2, 1], ["ab"]).err().unwrap();
        match err {
            SolverError::InvalidPuzzle(pe) => {
                assert!(matches!(*pe, PuzzleError::LengthMismatch { cells: 4, total: 3 }));
            }
            other => panic!("Expected InvalidPuzzle, got: {other:?}"),
        }
    }

    #[test]
    fn test_search_before_initialize() {
        let solver = Solver::new(SolverConfig::default());
        let puzzle: Puzzle = "abcd:2,2".parse().unwrap();
        assert!(matches!(solver.search(solver.root_state(&puzzle)), Err(SolverError::Uninitialized)));
    }
}
