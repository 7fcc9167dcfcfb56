//! The parallel search over board states.
//!
//! # Error Handling
//!
//! The solver uses [`SolverError`] with five variants:
//!
//! - S001: `InvalidPuzzle` (the board or word lengths break the input contract (wraps [`PuzzleError`]))
//! - S002: `WordList` (the word source could not be read)
//! - S003: `Trie` (a persisted trie could not be loaded or saved)
//! - S004: `WorkerSpawn` (the OS refused to start a search thread)
//! - S005: `Uninitialized` (search requested before a trie was installed)
//!
//! Each error has a `code()`, optional `help()`, and `display_detailed()` method.
//!
//! # How a search runs
//!
//! 1. The starting state is expanded once on the calling thread.
//! 2. Those children are dealt round-robin to the workers, each of which
//!    owns a LIFO stack and explores its share depth-first. There is no work
//!    stealing, so one unlucky partition can keep a single worker busy long
//!    after the rest have finished.
//! 3. Finished boards go out on the solution channel and early word guesses
//!    on the test channel. [`Search`] polls both and yields [`Candidate`]s.
//!
//! # Examples
//!
//! ```
//! use wordbrain::puzzle::Puzzle;
//! use wordbrain::solver::{Candidate, Solver, SolverConfig};
//!
//! let puzzle: Puzzle = "abcd:2,2".parse()?;
//! let mut solver = Solver::new(SolverConfig::default());
//! let solutions: Vec<Candidate> = solver
//!     .solve(&puzzle, ["ab", "cd", "ac", "bd"])?
//!     .filter(Candidate::is_solution)
//!     .collect();
//!
//! assert_eq!(solutions.len(), 4);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Feedback
//!
//! ```
//! use wordbrain::puzzle::Puzzle;
//! use wordbrain::solver::{Solver, SolverConfig};
//!
//! let puzzle: Puzzle = "abcd:2,2".parse()?;
//! let mut solver = Solver::new(SolverConfig::default());
//! // the game rejected "ab"; nothing containing it is yielded
//! solver.mark_bad_word("ab");
//! for candidate in solver.solve(&puzzle, ["ab", "cd", "ac", "bd"])? {
//!     assert!(!candidate.state().contains_word("ab"));
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::board::{BoardState, Cell, Settle};
use crate::errors::PuzzleError;
use crate::feedback::Feedback;
use crate::letters::LetterCounts;
use crate::puzzle::Puzzle;
use crate::trie::{Trie, TrieError};
use crossbeam_channel::{unbounded, Receiver, Select, Sender, TryRecvError};
use instant::Instant;
use log::{debug, info, warn};
use std::any::Any;
use std::collections::HashSet;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Boards with at most this many letters left never propose test words.
pub const SEEN_THRESHOLD: usize = 25;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Index of a search worker, `0..worker_count`.
pub type WorkerId = usize;

/// Unified error type for the solver pipeline.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    /// The puzzle failed validation before any search started.
    #[error("invalid puzzle: {0}")]
    InvalidPuzzle(#[from] Box<PuzzleError>),

    #[error("failed to read word list: {source}")]
    WordList {
        #[source]
        source: io::Error,
    },

    #[error("trie error: {0}")]
    Trie(#[from] TrieError),

    #[error("failed to start search worker {id}: {source}")]
    WorkerSpawn {
        id: WorkerId,
        #[source]
        source: io::Error,
    },

    #[error("no trie installed; build or load one before searching")]
    Uninitialized,
}

impl SolverError {
    /// Returns the error code for this error variant
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            SolverError::InvalidPuzzle(_) => "S001",
            SolverError::WordList { .. } => "S002",
            SolverError::Trie(_) => "S003",
            SolverError::WorkerSpawn { .. } => "S004",
            SolverError::Uninitialized => "S005",
        }
    }

    /// Returns a short description of this error type (for documentation)
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            SolverError::InvalidPuzzle(_) => "Puzzle failed validation",
            SolverError::WordList { .. } => "Word list could not be read",
            SolverError::Trie(_) => "Persisted trie could not be loaded or saved",
            SolverError::WorkerSpawn { .. } => "Search worker thread could not be started",
            SolverError::Uninitialized => "Search started without a trie",
        }
    }

    /// Returns a helpful suggestion for this error
    #[must_use]
    pub fn help(&self) -> Option<&'static str> {
        match self {
            SolverError::InvalidPuzzle(_) => None, // PuzzleError has its own help
            SolverError::WordList { .. } => Some("Check the path passed with -w; the file must be newline-delimited text"),
            SolverError::Trie(_) => Some("Rebuild the trie file with `wordbrain build-trie`"),
            SolverError::WorkerSpawn { .. } => Some("Try fewer workers with -j"),
            SolverError::Uninitialized => Some("Call Solver::solve, or Solver::initialize with a trie, before Solver::search"),
        }
    }

    /// Formats the error with code and optional help text
    #[must_use]
    pub fn display_detailed(&self) -> String {
        match self {
            SolverError::InvalidPuzzle(pe) => {
                // delegate to PuzzleError's detailed display
                format!("{}\n  caused by: {}", self.code(), pe.display_detailed())
            }
            _ => crate::errors::format_error_with_code_and_help(&self.to_string(), self.code(), self.help()),
        }
    }
}

/// Search tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    /// Number of worker threads; `None` means half the available parallelism (at least one).
    pub workers: Option<usize>,
    /// States with more letters left than this propose one unseen word for early testing.
    pub seen_threshold: usize,
    pub settle: Settle,
    /// How long [`Search`] waits for a message when both channels were empty.
    pub poll_interval: Duration,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            workers: None,
            seen_threshold: SEEN_THRESHOLD,
            settle: Settle::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Something the search wants the caller to try on the game.
#[derive(Debug, Clone)]
pub enum Candidate {
    /// A board cleared completely.
    Solution(BoardState),
    /// A partial board whose `word` has not been tried yet. If the game
    /// rejects it, marking it bad prunes every branch that uses it.
    Test { word: String, state: BoardState },
}

impl Candidate {
    pub fn state(&self) -> &BoardState {
        match self {
            Candidate::Solution(state) | Candidate::Test { state, .. } => state,
        }
    }

    pub fn into_state(self) -> BoardState {
        match self {
            Candidate::Solution(state) | Candidate::Test { state, .. } => state,
        }
    }

    pub fn is_solution(&self) -> bool {
        matches!(self, Candidate::Solution(_))
    }
}

/// Messages on the solution channel.
#[derive(Debug)]
enum WorkItem {
    Solution(BoardState),
    /// Sent last by a worker whose stack ran dry (or that was told to stop).
    WorkerDone { id: WorkerId, expanded: usize },
    WorkerFailed { id: WorkerId, reason: String },
}

#[derive(Debug)]
struct TestCandidate {
    word: String,
    state: BoardState,
}

/// Counters reported by [`Search::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub solutions: usize,
    pub tests: usize,
    /// Items dropped at yield time because they held a bad or already tested word.
    pub swallowed: usize,
    /// States expanded by workers that have reported back.
    pub expanded: usize,
}

/// Builds tries and launches searches, and carries the feedback shared with
/// every search it starts.
#[derive(Debug)]
pub struct Solver {
    config: SolverConfig,
    feedback: Arc<Feedback>,
    trie: Option<Arc<Trie>>,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        Self::with_feedback(config, Arc::new(Feedback::new()))
    }

    /// Share an existing set of bad/tested words, e.g. across levels.
    pub fn with_feedback(config: SolverConfig, feedback: Arc<Feedback>) -> Self {
        Solver { config, feedback, trie: None }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn feedback(&self) -> &Arc<Feedback> {
        &self.feedback
    }

    /// The game rejected `word`. Searches prune it from now on; anything
    /// already queued is filtered when it reaches the consumer.
    pub fn mark_bad_word(&self, word: &str) {
        self.feedback.mark_bad_word(word);
    }

    /// `word` has been tried on the game and is no longer proposed as a test.
    pub fn mark_tested_word(&self, word: &str) {
        self.feedback.mark_tested_word(word);
    }

    /// Build a trie holding only the words that could appear on this board:
    /// the word's length is one of `word_lengths` and its letters are a
    /// sub-multiset of `letters`.
    ///
    /// Returns the trie and the number of words added.
    pub fn build_trie<'w, I>(letters: &[char], word_lengths: &[usize], words: I) -> (Trie, usize)
    where
        I: IntoIterator<Item = &'w str>,
    {
        let mut trie = Trie::new();
        let Some(board) = LetterCounts::of_chars(letters.iter().copied()) else {
            return (trie, 0);
        };
        let lengths: HashSet<usize> = word_lengths.iter().copied().collect();

        let mut added = 0;
        for word in words {
            if !lengths.contains(&word.chars().count()) {
                continue;
            }
            // skip words needing more of a letter than the board holds
            if !LetterCounts::of_word(word).is_some_and(|counts| counts.is_sub_multiset_of(&board)) {
                continue;
            }
            if trie.add_word(word) {
                added += 1;
            }
        }

        info!("Added {added} words to trie");
        (trie, added)
    }

    /// Install the trie that later searches walk.
    pub fn initialize(&mut self, trie: Trie) {
        self.trie = Some(Arc::new(trie));
    }

    pub fn trie(&self) -> Option<&Trie> {
        self.trie.as_deref()
    }

    /// Number of workers a search will start (before capping at the number of
    /// initial states).
    pub fn worker_count(&self) -> usize {
        match self.config.workers {
            Some(n) => n.max(1),
            None => thread::available_parallelism().map_or(1, |n| n.get() / 2).max(1),
        }
    }

    pub fn root_state(&self, puzzle: &Puzzle) -> BoardState {
        BoardState::from_puzzle(puzzle, self.config.settle)
    }

    /// Build a trie for `puzzle` from `words`, install it and start searching.
    ///
    /// # Errors
    ///
    /// Returns `SolverError::WorkerSpawn` if a worker thread cannot be started.
    pub fn solve<'w, I>(&mut self, puzzle: &Puzzle, words: I) -> Result<Search, SolverError>
    where
        I: IntoIterator<Item = &'w str>,
    {
        let (trie, _) = Self::build_trie(puzzle.letters(), puzzle.word_lengths(), words);
        self.initialize(trie);
        self.search(self.root_state(puzzle))
    }

    /// Validate raw letters and lengths, then [`Solver::solve`].
    ///
    /// # Errors
    ///
    /// Returns `SolverError::InvalidPuzzle` if the input contract is broken,
    /// otherwise as [`Solver::solve`].
    pub fn solve_grid<'w, I>(&mut self, letters: &[char], word_lengths: &[usize], words: I) -> Result<Search, SolverError>
    where
        I: IntoIterator<Item = &'w str>,
    {
        let puzzle = Puzzle::new(letters.to_vec(), word_lengths.to_vec())?;
        self.solve(&puzzle, words)
    }

    /// Start a search from `root` using the installed trie.
    ///
    /// # Errors
    ///
    /// Returns `SolverError::Uninitialized` if no trie is installed and
    /// `SolverError::WorkerSpawn` if a worker thread cannot be started.
    pub fn search(&self, root: BoardState) -> Result<Search, SolverError> {
        let trie = self.trie.clone().ok_or(SolverError::Uninitialized)?;
        let started = Instant::now();

        let (solution_tx, solution_rx) = unbounded();
        let (test_tx, test_rx) = unbounded();
        let expander = Expander {
            trie,
            feedback: Arc::clone(&self.feedback),
            seen_threshold: self.config.seen_threshold,
            solution_tx,
            test_tx,
        };

        let initial = expander.expand(&root);
        let worker_count = self.worker_count().min(initial.len());
        info!("Searching {} initial states with {worker_count} workers", initial.len());

        let mut partitions: Vec<Vec<BoardState>> = (0..worker_count).map(|_| Vec::new()).collect();
        for (i, state) in initial.into_iter().enumerate() {
            partitions[i % worker_count].push(state);
        }

        let shutdown = Arc::new(AtomicBool::new(false));
        let mut workers = Vec::with_capacity(worker_count);
        for (id, stack) in partitions.into_iter().enumerate() {
            debug!("worker {id} starts with {} states", stack.len());
            let expander = expander.clone();
            let stop = Arc::clone(&shutdown);
            let spawned = thread::Builder::new()
                .name(format!("wordbrain-worker-{id}"))
                .spawn(move || run_worker(id, stack, &expander, &stop));

            match spawned {
                Ok(handle) => workers.push(Some(handle)),
                Err(source) => {
                    shutdown.store(true, Ordering::Relaxed);
                    for handle in workers.into_iter().flatten() {
                        let _ = handle.join();
                    }
                    return Err(SolverError::WorkerSpawn { id, source });
                }
            }
        }
        // only the workers hold senders now, so the channels disconnect once they all exit
        drop(expander);

        Ok(Search {
            solution_rx,
            test_rx,
            feedback: Arc::clone(&self.feedback),
            active: workers.len(),
            workers,
            shutdown,
            poll_interval: self.config.poll_interval,
            tests_first: false,
            pending_release: None,
            failed: Vec::new(),
            stats: SearchStats::default(),
            started,
            finished: false,
        })
    }
}

/// One worker's view of the search: everything `expand` needs, cloned per thread.
#[derive(Clone)]
struct Expander {
    trie: Arc<Trie>,
    feedback: Arc<Feedback>,
    seen_threshold: usize,
    solution_tx: Sender<WorkItem>,
    test_tx: Sender<TestCandidate>,
}

impl Expander {
    /// Children of `state` that still need exploring. Completed boards and
    /// test proposals are sent out on the channels as a side effect.
    fn expand(&self, state: &BoardState) -> Vec<BoardState> {
        let mut children = Vec::new();
        let mut keys: HashSet<Arc<[Cell]>> = HashSet::new();

        for root in state.valid_roots(&self.trie) {
            for path in state.valid_paths(root, &self.trie) {
                if state.contains_word(&state.word_for(&path)) {
                    continue;
                }

                let child = state.derive_child(&path);
                if keys.contains(&child.canonical_key()) {
                    continue;
                }
                if self.feedback.any_bad(child.words()) {
                    continue;
                }

                if child.is_solution() {
                    // a send error means the search was dropped; nothing left to do
                    let _ = self.solution_tx.send(WorkItem::Solution(child));
                    continue;
                }

                keys.insert(child.canonical_key());

                if child.remaining_cells() > self.seen_threshold {
                    if let Some(word) = child.words().find(|w| self.feedback.claim_for_test(w)) {
                        let candidate = TestCandidate { word: word.to_string(), state: child.clone() };
                        let _ = self.test_tx.send(candidate);
                    }
                }

                children.push(child);
            }
        }

        children
    }
}

fn run_worker(id: WorkerId, mut stack: Vec<BoardState>, expander: &Expander, shutdown: &AtomicBool) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut expanded = 0;
        while !shutdown.load(Ordering::Relaxed) {
            let Some(state) = stack.pop() else { break };
            if expander.feedback.any_bad(state.words()) {
                continue;
            }
            stack.extend(expander.expand(&state));
            expanded += 1;
        }
        expanded
    }));

    let item = match outcome {
        Ok(expanded) => WorkItem::WorkerDone { id, expanded },
        Err(payload) => WorkItem::WorkerFailed { id, reason: panic_message(payload.as_ref()) },
    };
    let _ = expander.solution_tx.send(item);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

enum Polled {
    Yield(Candidate),
    /// Something arrived but nothing is yielded for it.
    Consumed,
    Empty,
    Disconnected,
}

/// A running search. Iterating polls the workers' channels and yields
/// candidates until every worker has finished and both channels are drained.
///
/// Dropping a `Search` stops its workers and waits for them to exit.
pub struct Search {
    solution_rx: Receiver<WorkItem>,
    test_rx: Receiver<TestCandidate>,
    feedback: Arc<Feedback>,
    workers: Vec<Option<JoinHandle<()>>>,
    active: usize,
    shutdown: Arc<AtomicBool>,
    poll_interval: Duration,
    /// Flipped every pass so neither channel can starve the other.
    tests_first: bool,
    /// Test word yielded last; released from the seen set on the next call.
    pending_release: Option<String>,
    failed: Vec<WorkerId>,
    stats: SearchStats,
    started: Instant,
    finished: bool,
}

impl Search {
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn solutions_yielded(&self) -> usize {
        self.stats.solutions
    }

    pub fn tests_yielded(&self) -> usize {
        self.stats.tests
    }

    /// Workers that panicked; their partitions were only partly searched.
    pub fn failed_workers(&self) -> &[WorkerId] {
        &self.failed
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn active_workers(&self) -> usize {
        self.active
    }

    fn release_pending(&mut self) {
        if let Some(word) = self.pending_release.take() {
            if self.feedback.release_seen(&word) {
                debug!("released test word {word}");
            }
        }
    }

    fn retire(&mut self, id: WorkerId) {
        if let Some(handle) = self.workers.get_mut(id).and_then(Option::take) {
            if handle.join().is_err() {
                warn!("worker {id} exited abnormally");
            }
        }
        self.active = self.active.saturating_sub(1);
        debug!("{} workers left", self.active);
    }

    fn poll_solutions(&mut self) -> Polled {
        match self.solution_rx.try_recv() {
            Ok(WorkItem::Solution(state)) => {
                if self.feedback.any_bad(state.words()) {
                    self.stats.swallowed += 1;
                    Polled::Consumed
                } else {
                    self.stats.solutions += 1;
                    Polled::Yield(Candidate::Solution(state))
                }
            }
            Ok(WorkItem::WorkerDone { id, expanded }) => {
                debug!("worker {id} finished after expanding {expanded} states");
                self.stats.expanded += expanded;
                self.retire(id);
                Polled::Consumed
            }
            Ok(WorkItem::WorkerFailed { id, reason }) => {
                warn!("worker {id} failed, its share of the search is incomplete: {reason}");
                self.failed.push(id);
                self.retire(id);
                Polled::Consumed
            }
            Err(TryRecvError::Empty) => Polled::Empty,
            Err(TryRecvError::Disconnected) => Polled::Disconnected,
        }
    }

    fn poll_tests(&mut self) -> Polled {
        match self.test_rx.try_recv() {
            Ok(TestCandidate { word, state }) => {
                let fresh = !self.feedback.is_tested(&word) && !self.feedback.any_bad(state.words());
                if fresh {
                    self.stats.tests += 1;
                    self.pending_release = Some(word.clone());
                    Polled::Yield(Candidate::Test { word, state })
                } else {
                    self.stats.swallowed += 1;
                    self.feedback.release_seen(&word);
                    Polled::Consumed
                }
            }
            Err(TryRecvError::Empty) => Polled::Empty,
            Err(TryRecvError::Disconnected) => Polled::Disconnected,
        }
    }

    fn wait(&self) {
        let mut select = Select::new();
        select.recv(&self.solution_rx);
        select.recv(&self.test_rx);
        // a timeout just means another polling pass
        let _ = select.ready_timeout(self.poll_interval);
    }
}

impl Iterator for Search {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        self.release_pending();
        if self.finished {
            return None;
        }

        loop {
            self.tests_first = !self.tests_first;
            let mut idle = true;
            let mut disconnected = 0;
            for tests in [self.tests_first, !self.tests_first] {
                let polled = if tests { self.poll_tests() } else { self.poll_solutions() };
                match polled {
                    Polled::Yield(candidate) => return Some(candidate),
                    Polled::Consumed => idle = false,
                    Polled::Empty => {}
                    Polled::Disconnected => disconnected += 1,
                }
            }
            if !idle {
                continue;
            }

            // drained after the last worker reported in: nothing else can arrive
            if self.active == 0 {
                self.finished = true;
                return None;
            }

            if disconnected == 2 {
                warn!("{} workers vanished without reporting; stopping the search", self.active);
                self.finished = true;
                return None;
            }

            self.wait();
        }
    }
}

impl Drop for Search {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        for handle in self.workers.iter_mut().filter_map(Option::take) {
            let _ = handle.join();
        }
        self.release_pending();
        info!(
            "Search finished in {:.3}s ({} solutions, {} tests, {} swallowed)",
            self.elapsed().as_secs_f64(),
            self.stats.solutions,
            self.stats.tests,
            self.stats.swallowed
        );
    }
}

/// Render a solution's words for display, e.g. `AB • CD`.
pub fn solution_to_string(state: &BoardState) -> String {
    state.words().map(str::to_uppercase).collect::<Vec<_>>().join(" • ")
}
