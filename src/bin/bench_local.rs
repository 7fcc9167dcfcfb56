//! `bench_local.rs`: quick local timing runner (no Criterion)
//!
//! PURPOSE
//! -------
//! - Fast, ad-hoc timing for a handful of boards on *your* machine.
//! - Loads the word list once, then solves each board several times and reports the median.
//! - Every run searches the board to exhaustion, so solution counts are comparable across runs.
//!
//! HOW TO RUN
//! ----------
//! - Optimized build:                `cargo run --bin bench_local --release`
//! - Multiple repeats:               `cargo run --bin bench_local --release -- -r 5`
//! - Fixed worker count:             `cargo run --bin bench_local --release -- -j 4`
//! - Print a few solutions:          `cargo run --bin bench_local --release -- -p 5`
//!
//! NOTES
//! -----
//! - Boards live in `get_cases()` below.
//! - Trie construction is timed together with the search; it is part of every real solve.
//! - We report the *median* over repeats (more robust than mean for small _N_).

use clap::Parser;
use std::hint::black_box;
use std::time::Instant;
use wordbrain::puzzle::Puzzle;
use wordbrain::solver::{self, Candidate, Solver, SolverConfig};
use wordbrain::word_list::WordList;

/// Simple local benchmark runner: load word list once, time several boards.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the word list file (one word per line)
    #[arg(
        short,
        long,
        default_value = concat!(env!("CARGO_MANIFEST_DIR"), "/data/words.txt")
    )]
    word_list: String,

    /// Number of repeats per board (use >1 to reduce noise; median is reported)
    #[arg(short = 'r', long = "repeats", default_value_t = 1)]
    num_repeats: usize,

    /// Number of worker threads (default: half the available cores)
    #[arg(short = 'j', long)]
    workers: Option<usize>,

    /// Print up to this many solutions per board (0 = print none)
    #[arg(short = 'p', long = "print", default_value_t = 0)]
    print_limit: usize,
}

/// Edit/add new boards here, as `letters:len,len,...`.
fn get_cases() -> Vec<&'static str> {
    vec![
        "catdogsun:3,3,3",
        "bearlionwolfdeer:4,4,4,4",
        "bearlionwolfdeer:8,8",
        "applegrapelemonmelonpeach:5,5,5,5,5",
        "tigerhorsesheepzebracamel:5,5,5,5,5",
    ]
}

/// Small helper: robust central tendency for small samples.
fn median(mut xs: Vec<f64>) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.sort_by(f64::total_cmp);
    let n = xs.len();
    if n % 2 == 1 {
        xs[n / 2]
    } else {
        0.5 * (xs[n / 2 - 1] + xs[n / 2])
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load the word list once. This I/O is *not* included in per-board timing.
    eprintln!("Loading word list from: {}", cli.word_list);
    let t_load = Instant::now();
    let word_list = WordList::load_from_path(&cli.word_list)?;
    eprintln!("Loaded {} words in {:.3}s", word_list.len(), t_load.elapsed().as_secs_f64());

    let config = SolverConfig { workers: cli.workers, ..SolverConfig::default() };
    let mut summary: Vec<(&str, f64, usize)> = Vec::new();

    for (idx, case) in get_cases().into_iter().enumerate() {
        eprintln!("\n[{:02}] {}", idx + 1, case);
        let puzzle: Puzzle = case.parse()?;

        let mut times = Vec::with_capacity(cli.num_repeats);
        let mut last_solutions: Vec<Candidate> = Vec::new();

        for rep in 0..cli.num_repeats {
            let mut solver = Solver::new(config.clone());
            let t_solve = Instant::now();
            let search = solver.solve(black_box(&puzzle), word_list.iter())?;
            let solutions: Vec<Candidate> = search.filter(Candidate::is_solution).collect();
            let solve_secs = t_solve.elapsed().as_secs_f64();

            times.push(solve_secs);
            eprintln!(
                "  run {:>2}/{:>2}: {:.3}s ({} solutions)",
                rep + 1,
                cli.num_repeats,
                solve_secs,
                solutions.len()
            );
            last_solutions = solutions;
        }

        let med = median(times);
        for candidate in last_solutions.iter().take(cli.print_limit) {
            println!("{}", solver::solution_to_string(candidate.state()));
        }

        eprintln!("  → median {:.3}s over {} run(s)", med, cli.num_repeats);
        summary.push((case, med, last_solutions.len()));
    }

    eprintln!("\n==== Summary ====");
    eprintln!("{:<40} | {:>10} | {:>11}", "board", "median (s)", "# solutions");
    eprintln!("{:-<40}-+-{:-<10}-+-{:-<11}", "", "", "");
    for (case, med, num_solutions) in &summary {
        eprintln!("{case:<40} | {med:>10.3} | {num_solutions:>11}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median() {
        assert_eq!(median(vec![]), 0.0);
        assert_eq!(median(vec![3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(vec![4.0, 1.0, 2.0, 3.0]), 2.5);
    }

    #[test]
    fn test_cases_parse() {
        for case in get_cases() {
            assert!(case.parse::<Puzzle>().is_ok(), "bad bench case {case}");
        }
    }
}
