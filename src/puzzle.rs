//! `puzzle`: board letters plus the word lengths required to clear the board.
//!
//! A puzzle is written as `letters:len,len,...`, rows concatenated top to
//! bottom, e.g. `abcd:2,2` for a 2×2 board that must be split into two
//! 2-letter words. A levels file holds one such puzzle per line, which is how
//! captured game boards are fed to the solver.

use crate::errors::PuzzleError;
use crate::letters::GridChar;
use nom::{
    bytes::complete::take_while1,
    character::complete::{char, digit1, multispace0},
    multi::separated_list1,
    sequence::delimited,
    IResult,
    Parser,
};
use std::fmt;
use std::str::FromStr;

/// Boards with fewer cells than this are rejected.
pub const MIN_PUZZLE_SIZE: usize = 4;

/// Parser result type: input, output, with our custom `PuzzleError`
pub type PResult<'a, O> = IResult<&'a str, O, Box<PuzzleError>>;

/// A validated puzzle: a square board of letters and the lengths of the words
/// that together use up every letter exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puzzle {
    letters: Vec<char>,
    word_lengths: Vec<usize>,
    side: usize,
}

impl Puzzle {
    /// Build a puzzle, enforcing the input contract.
    ///
    /// # Errors
    ///
    /// Returns a `PuzzleError` if the board is empty, not square, too small,
    /// contains anything but `a..=z`, or if the word lengths don't add up to
    /// the number of letters.
    pub fn new(letters: Vec<char>, word_lengths: Vec<usize>) -> Result<Self, Box<PuzzleError>> {
        let side = validate(&letters, &word_lengths)?;
        Ok(Puzzle { letters, word_lengths, side })
    }

    /// Convenience constructor from a row-major letter string.
    ///
    /// # Errors
    ///
    /// Same as [`Puzzle::new`].
    pub fn from_parts(letters: &str, word_lengths: &[usize]) -> Result<Self, Box<PuzzleError>> {
        Self::new(letters.to_lowercase().chars().collect(), word_lengths.to_vec())
    }

    pub fn letters(&self) -> &[char] {
        &self.letters
    }

    pub fn word_lengths(&self) -> &[usize] {
        &self.word_lengths
    }

    /// Number of cells along one edge of the board.
    pub fn side(&self) -> usize {
        self.side
    }

    /// Number of cells on the board.
    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }
}

impl fmt::Display for Puzzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letters: String = self.letters.iter().collect();
        let lengths: Vec<String> = self.word_lengths.iter().map(ToString::to_string).collect();
        write!(f, "{letters}:{}", lengths.join(","))
    }
}

/// Check the puzzle input contract and return the board's side length.
///
/// # Errors
///
/// See [`Puzzle::new`].
pub fn validate(letters: &[char], word_lengths: &[usize]) -> Result<usize, Box<PuzzleError>> {
    if letters.is_empty() {
        return Err(Box::new(PuzzleError::EmptyBoard));
    }
    if let Some(&invalid_char) = letters.iter().find(|c| !c.is_letter()) {
        return Err(Box::new(PuzzleError::InvalidLetter { invalid_char }));
    }
    if word_lengths.is_empty() {
        return Err(Box::new(PuzzleError::NoWordLengths));
    }
    if word_lengths.contains(&0) {
        return Err(Box::new(PuzzleError::ZeroWordLength));
    }

    let len = letters.len();
    if len < MIN_PUZZLE_SIZE {
        return Err(Box::new(PuzzleError::TooSmall { len, min: MIN_PUZZLE_SIZE }));
    }

    let side = integer_sqrt(len).ok_or(PuzzleError::NotSquare { len })?;

    let total: usize = word_lengths.iter().sum();
    if total != len {
        return Err(Box::new(PuzzleError::LengthMismatch { cells: len, total }));
    }

    debug_assert_eq!(side * side, len);
    Ok(side)
}

fn integer_sqrt(n: usize) -> Option<usize> {
    let mut side = 0;
    while side * side < n {
        side += 1;
    }
    (side * side == n).then_some(side)
}

impl FromStr for Puzzle {
    type Err = Box<PuzzleError>;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (letters, lengths) = match puzzle_parts(raw) {
            Ok(("", parts)) => parts,
            Ok((rest, _)) => {
                return Err(Box::new(PuzzleError::ParseFailure {
                    s: format!("unexpected trailing input \"{rest}\" in \"{}\"", raw.trim()),
                }))
            }
            Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
                // a missing separator is the common mistake; say so plainly
                if !raw.contains(':') {
                    return Err(Box::new(PuzzleError::ParseFailure { s: raw.trim().to_string() }));
                }
                return Err(e);
            }
            Err(nom::Err::Incomplete(_)) => {
                return Err(Box::new(PuzzleError::ParseFailure { s: raw.trim().to_string() }))
            }
        };

        let word_lengths = lengths
            .into_iter()
            .map(str::parse::<usize>)
            .collect::<Result<Vec<_>, _>>()?;

        Puzzle::new(letters.to_lowercase().chars().collect(), word_lengths)
    }
}

// === Token parsers ===

fn board_letters(input: &str) -> PResult<'_, &str> {
    take_while1(|c: char| c != ':' && !c.is_whitespace()).parse(input)
}

fn word_lengths(input: &str) -> PResult<'_, Vec<&str>> {
    separated_list1(delimited(multispace0, char(','), multispace0), digit1).parse(input)
}

fn puzzle_parts(input: &str) -> PResult<'_, (&str, Vec<&str>)> {
    let (input, _) = multispace0(input)?;
    let (input, letters) = board_letters(input)?;
    let (input, _) = delimited(multispace0, char(':'), multispace0).parse(input)?;
    let (input, lengths) = word_lengths(input)?;
    let (input, _) = multispace0(input)?;
    Ok((input, (letters, lengths)))
}

/// Parse a levels file: one puzzle per line, blank lines and `#` comments skipped.
///
/// # Errors
///
/// Returns the first line's `PuzzleError`, annotated with its line number.
pub fn parse_levels(contents: &str) -> Result<Vec<Puzzle>, Box<PuzzleError>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(i, line)| {
            line.parse::<Puzzle>().map_err(|e| {
                Box::new(PuzzleError::ParseFailure { s: format!("line {}: {}", i + 1, e.display_detailed()) })
            })
        })
        .collect()
}

/// Native convenience method: read a levels file and parse it.
///
/// # Errors
///
/// Will return an `Error` if the file cannot be read or any line is malformed.
pub fn load_levels<P: AsRef<std::path::Path>>(path: P) -> std::io::Result<Vec<Puzzle>> {
    let path_ref = path.as_ref();
    let data = std::fs::read_to_string(path_ref).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("failed to read levels from '{}': {}", path_ref.display(), e),
        )
    })?;
    parse_levels(&data).map_err(|e| (*e).into())
}
