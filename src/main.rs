use clap::{Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use wordbrain::board::{BoardState, Settle};
use wordbrain::feedback::Feedback;
use wordbrain::puzzle::{self, Puzzle};
use wordbrain::solver::{self, Candidate, Search, Solver, SolverConfig, SolverError, SEEN_THRESHOLD};
use wordbrain::trie::Trie;
use wordbrain::word_list::WordList;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");

/// WordBrain puzzle solver
#[derive(Parser, Debug)]
#[command(author, version = VERSION, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Solve one or more puzzles
    Solve(SolveArgs),
    /// Build a trie from a word list and save it to disk
    BuildTrie(BuildTrieArgs),
    /// Print the longest word reachable from every cell of a board
    Longest(LongestArgs),
}

#[derive(Args, Debug)]
struct SolveArgs {
    /// Puzzles to solve, as letters:len,len (e.g. "catdogsun:3,3,3")
    puzzles: Vec<String>,

    /// File with one puzzle per line
    #[arg(long)]
    levels: Option<PathBuf>,

    /// Path to the word list file (one word per line)
    #[arg(
        short,
        long,
        default_value = concat!(env!("CARGO_MANIFEST_DIR"), "/data/words.txt")
    )]
    word_list: PathBuf,

    /// Use a trie saved by `build-trie` instead of the word list
    #[arg(long)]
    trie: Option<PathBuf>,

    /// Number of worker threads (default: half the available cores)
    #[arg(short = 'j', long)]
    workers: Option<usize>,

    /// Boards with more letters left than this propose words for early testing
    #[arg(long, default_value_t = SEEN_THRESHOLD)]
    seen_threshold: usize,

    /// Leave emptied cells in place instead of letting letters fall
    #[arg(long)]
    in_place: bool,

    /// Maximum number of solutions to print per puzzle
    #[arg(short = 'n', long, default_value_t = 10)]
    num_results_requested: usize,

    /// Words already known to be wrong (repeatable)
    #[arg(long = "bad")]
    bad_words: Vec<String>,

    /// Ask whether each proposed word was accepted by the game
    #[arg(short, long)]
    interactive: bool,
}

#[derive(Args, Debug)]
struct BuildTrieArgs {
    /// Path to the word list file (one word per line)
    #[arg(
        short,
        long,
        default_value = concat!(env!("CARGO_MANIFEST_DIR"), "/data/words.txt")
    )]
    word_list: PathBuf,

    /// Where to write the trie
    #[arg(short, long)]
    output: PathBuf,

    /// Only keep words of these lengths (e.g. 3,4,5)
    #[arg(long, value_delimiter = ',')]
    lengths: Vec<usize>,
}

#[derive(Args, Debug)]
struct LongestArgs {
    /// Trie file written by `build-trie`
    #[arg(long)]
    trie: PathBuf,

    /// Board letters, rows concatenated (e.g. "catdogsun")
    letters: String,
}

/// Entry point of the WordBrain CLI.
///
/// Delegates to [`try_main`], catching any errors and printing them
/// in a user-friendly way before exiting with code 1.
fn main() -> ExitCode {
    // Set up logging
    let debug_enabled = std::env::var("WORDBRAIN_DEBUG").is_ok();
    wordbrain::log::init_logger(debug_enabled);

    if let Err(e) = try_main() {
        // Print the error message to stderr, with detailed formatting if it's a SolverError
        if let Some(solver_err) = e.downcast_ref::<SolverError>() {
            eprintln!("Error: {}", solver_err.display_detailed());
        } else {
            eprintln!("Error: {e}");
        }
        // Exit explicitly with a nonzero code so scripts can detect failure
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn try_main() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Command::Solve(args) => run_solve(&args),
        Command::BuildTrie(args) => run_build_trie(&args),
        Command::Longest(args) => run_longest(&args),
    }
}

/// Where the words for each puzzle come from.
enum WordSource {
    /// Filtered per puzzle into a fresh trie.
    List(WordList),
    /// Used as is for every puzzle.
    Trie(Trie),
}

impl WordSource {
    fn load(args: &SolveArgs) -> Result<Self, SolverError> {
        match &args.trie {
            Some(path) => Ok(WordSource::Trie(Trie::load(path)?)),
            None => WordList::load_from_path(&args.word_list)
                .map(WordSource::List)
                .map_err(|source| SolverError::WordList { source }),
        }
    }

    fn len(&self) -> usize {
        match self {
            WordSource::List(word_list) => word_list.len(),
            WordSource::Trie(trie) => trie.len(),
        }
    }

    fn start(&self, solver: &mut Solver, puzzle: &Puzzle) -> Result<Search, SolverError> {
        match self {
            WordSource::List(word_list) => solver.solve(puzzle, word_list.iter()),
            WordSource::Trie(trie) => {
                solver.initialize(trie.clone());
                solver.search(solver.root_state(puzzle))
            }
        }
    }
}

fn run_solve(args: &SolveArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut puzzles = args
        .puzzles
        .iter()
        .map(|raw| raw.parse::<Puzzle>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(SolverError::from)?;
    if let Some(path) = &args.levels {
        puzzles.extend(puzzle::load_levels(path)?);
    }
    if puzzles.is_empty() {
        return Err("no puzzles given; pass PUZZLE arguments or --levels FILE".into());
    }

    // 1. Load the word source once for all puzzles
    let t_load = Instant::now();
    let source = WordSource::load(args)?;
    eprintln!("Loaded {} words in {:.3}s", source.len(), t_load.elapsed().as_secs_f64());

    let config = SolverConfig {
        workers: args.workers,
        seen_threshold: args.seen_threshold,
        settle: if args.in_place { Settle::InPlace } else { Settle::Gravity },
        ..SolverConfig::default()
    };

    // 2. Solve each level with its own feedback
    for (level, puzzle) in puzzles.iter().enumerate() {
        println!("Level {}: {puzzle}", level + 1);

        let mut solver = Solver::new(config.clone());
        for word in &args.bad_words {
            solver.mark_bad_word(&word.to_lowercase());
        }

        let t_solve = Instant::now();
        let search = source.start(&mut solver, puzzle)?;
        let (shown, solved) = if args.interactive {
            run_interactive(&solver, search)?
        } else {
            (print_solutions(search, args.num_results_requested), false)
        };

        if args.interactive && !solved {
            eprintln!("⚠️  Level {} not solved", level + 1);
        }
        eprintln!("Level {} done in {:.3}s ({shown} shown).", level + 1, t_solve.elapsed().as_secs_f64());
    }

    Ok(())
}

fn print_solutions(search: Search, limit: usize) -> usize {
    let mut shown = 0;
    for candidate in search.filter(Candidate::is_solution).take(limit) {
        let state = candidate.state();
        println!("{}", solver::solution_to_string(state));
        log::debug!("{}", describe_steps(state));
        shown += 1;
    }
    shown
}

/// The steps of a state, one per line, with each path against its own board.
fn describe_steps(state: &BoardState) -> String {
    state
        .steps()
        .iter()
        .map(|step| format!("  {} {:?}", step.word.to_uppercase(), step.path))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Answer {
    Accepted,
    Rejected,
    Quit,
}

fn ask(lines: &mut impl Iterator<Item = io::Result<String>>, word: &str) -> io::Result<Answer> {
    loop {
        eprint!("  was {} accepted? [y/n/q] ", word.to_uppercase());
        io::stderr().flush()?;
        let Some(line) = lines.next().transpose()? else {
            return Ok(Answer::Quit);
        };
        match line.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(Answer::Accepted),
            "n" | "no" => return Ok(Answer::Rejected),
            "q" | "quit" => return Ok(Answer::Quit),
            _ => {}
        }
    }
}

/// The words to enter on the game, in order, to try `candidate`. A test word
/// only exists on the board left by the words before it, so those come
/// first. Words accepted earlier need no second try.
fn words_to_enter<'c>(candidate: &'c Candidate, feedback: &Feedback) -> Vec<&'c str> {
    let state = candidate.state();
    match candidate {
        Candidate::Test { word, .. } => {
            let mut words: Vec<&str> = state
                .words()
                .take_while(|w| *w != word.as_str())
                .filter(|w| !feedback.is_tested(w))
                .collect();
            words.push(word.as_str());
            words
        }
        Candidate::Solution(_) => state.words().filter(|w| !feedback.is_tested(w)).collect(),
    }
}

/// Walk the candidates with the operator, feeding their answers back into
/// the search. Returns how many candidates were shown and whether the level
/// was solved.
fn run_interactive(solver: &Solver, search: Search) -> io::Result<(usize, bool)> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut shown = 0;

    for candidate in search {
        let state = candidate.state();
        let words = words_to_enter(&candidate, solver.feedback());

        shown += 1;
        let label = if candidate.is_solution() { "solution" } else { "test" };
        println!("{label}: {}", solver::solution_to_string(state));
        println!("{}", describe_steps(state));

        let mut all_accepted = true;
        for word in words {
            match ask(&mut lines, word)? {
                Answer::Accepted => solver.mark_tested_word(word),
                Answer::Rejected => {
                    solver.mark_bad_word(word);
                    all_accepted = false;
                    break;
                }
                Answer::Quit => return Ok((shown, false)),
            }
        }

        if all_accepted && candidate.is_solution() {
            println!("✓ solved: {}", solver::solution_to_string(state));
            return Ok((shown, true));
        }
    }

    Ok((shown, false))
}

fn run_build_trie(args: &BuildTrieArgs) -> Result<(), Box<dyn std::error::Error>> {
    let t_load = Instant::now();
    let word_list = WordList::load_from_path(&args.word_list).map_err(|source| SolverError::WordList { source })?;

    let trie: Trie = word_list
        .iter()
        .filter(|word| args.lengths.is_empty() || args.lengths.contains(&word.len()))
        .collect();
    trie.save(&args.output).map_err(SolverError::from)?;

    eprintln!(
        "Wrote {} words ({} nodes) to {} in {:.3}s",
        trie.len(),
        trie.node_count(),
        args.output.display(),
        t_load.elapsed().as_secs_f64()
    );
    Ok(())
}

fn run_longest(args: &LongestArgs) -> Result<(), Box<dyn std::error::Error>> {
    // a missing or unreadable trie is fatal here
    let trie = Trie::load(&args.trie).map_err(SolverError::from)?;

    let letters = args.letters.trim();
    let len = letters.chars().count();
    let puzzle = Puzzle::from_parts(letters, &[len]).map_err(SolverError::from)?;
    let board = BoardState::from_puzzle(&puzzle, Settle::InPlace);

    for root in board.path_roots() {
        match board.longest_path(root, &trie) {
            Some(path) => println!("{:>3} {}: {} {:?}", root.index, root.letter, board.word_for(&path).to_uppercase(), path),
            None => println!("{:>3} {}: -", root.index, root.letter),
        }
    }
    Ok(())
}
