//! Error types for puzzle input, with error codes and helpful messages.
//!
//! # Error Codes
//!
//! Each error variant has a unique code (P001-P010) for documentation lookup:
//!
//! - P001: `ParseFailure` (Generic puzzle parse failure)
//! - P002: `EmptyBoard` (No letters given)
//! - P003: `NotSquare` (Letter count is not a perfect square)
//! - P004: `LengthMismatch` (Word lengths do not add up to the letter count)
//! - P005: `TooSmall` (Board below the minimum puzzle size)
//! - P006: `InvalidLetter` (Board cell is not a lowercase letter)
//! - P007: `ZeroWordLength` (A requested word length of zero)
//! - P008: `NoWordLengths` (No word lengths given)
//! - P009: `ParseIntError` (Integer parsing error)
//! - P010: `NomError` (Low-level nom parser error)
//!
//! # Examples
//!
//! ```
//! use wordbrain::errors::PuzzleError;
//!
//! let err = PuzzleError::NotSquare { len: 5 };
//! assert_eq!(err.code(), "P003");
//! println!("{}", err.display_detailed());
//! ```

use nom::error::{ErrorKind, ParseError as NomParseError};
use std::io;
use std::num::ParseIntError;

/// Malformed puzzle input: a caller contract violation detected before any
/// search starts.
#[derive(Debug, thiserror::Error)]
pub enum PuzzleError {
    #[error("Puzzle parsing failed: \"{s}\"")]
    ParseFailure { s: String },

    #[error("Empty board (no letters)")]
    EmptyBoard,

    #[error("Board of {len} letters is not square")]
    NotSquare { len: usize },

    #[error("Word lengths sum to {total} but the board has {cells} letters")]
    LengthMismatch { cells: usize, total: usize },

    #[error("Board of {len} letters is below the minimum puzzle size of {min}")]
    TooSmall { len: usize, min: usize },

    #[error("Invalid board letter '{invalid_char}' (only a-z allowed)")]
    InvalidLetter { invalid_char: char },

    #[error("Word length 0 is not allowed")]
    ZeroWordLength,

    #[error("No word lengths given")]
    NoWordLengths,

    #[error("int-parsing error: {0}")]
    ParseIntError(#[from] ParseIntError),

    // nom parser error (lowest level)
    #[error("nom parser error: {0:?}")]
    NomError(ErrorKind),
}

impl From<PuzzleError> for io::Error {
    fn from(pe: PuzzleError) -> Self {
        io::Error::new(io::ErrorKind::InvalidInput, pe.to_string())
    }
}

impl From<ParseIntError> for Box<PuzzleError> {
    fn from(pie: ParseIntError) -> Self {
        Box::new(PuzzleError::ParseIntError(pie))
    }
}

impl<'a> NomParseError<&'a str> for Box<PuzzleError> {
    fn from_error_kind(_input: &'a str, kind: ErrorKind) -> Self {
        Box::new(PuzzleError::NomError(kind))
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

impl PuzzleError {
    /// Returns the error code for this error variant
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            PuzzleError::ParseFailure { .. } => "P001",
            PuzzleError::EmptyBoard => "P002",
            PuzzleError::NotSquare { .. } => "P003",
            PuzzleError::LengthMismatch { .. } => "P004",
            PuzzleError::TooSmall { .. } => "P005",
            PuzzleError::InvalidLetter { .. } => "P006",
            PuzzleError::ZeroWordLength => "P007",
            PuzzleError::NoWordLengths => "P008",
            PuzzleError::ParseIntError(_) => "P009",
            PuzzleError::NomError(_) => "P010",
        }
    }

    /// Returns a helpful suggestion or example for this error
    #[must_use]
    pub fn help(&self) -> Option<&'static str> {
        match self {
            PuzzleError::ParseFailure { .. } => Some("Expected format: letters:lengths (e.g., 'abcd:2,2')"),
            PuzzleError::EmptyBoard => Some("Give the board letters row by row, e.g. 'abcd' for a 2x2 board"),
            PuzzleError::NotSquare { .. } => Some("The number of letters must be a square (4, 9, 16, 25, ...)"),
            PuzzleError::LengthMismatch { .. } => Some("Every board letter belongs to exactly one word, so the lengths must add up to the letter count"),
            PuzzleError::TooSmall { .. } => Some("Boards smaller than 2x2 are not puzzles"),
            PuzzleError::InvalidLetter { .. } => Some("Only lowercase letters a-z are allowed on the board"),
            PuzzleError::ZeroWordLength => Some("Every word length must be at least 1"),
            PuzzleError::NoWordLengths => Some("Add the word lengths after the colon, e.g. 'abcd:2,2'"),
            _ => None,
        }
    }

    /// Formats the error with code and optional help text
    #[must_use]
    pub fn display_detailed(&self) -> String {
        format_error_with_code_and_help(&self.to_string(), self.code(), self.help())
    }
}

/// Helper function to format error messages with code and optional help text
pub(crate) fn format_error_with_code_and_help(base_msg: &str, code: &str, help: Option<&str>) -> String {
    if let Some(help_text) = help {
        format!("{base_msg} ({code})\n{help_text}")
    } else {
        format!("{base_msg} ({code})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_and_help() {
        let err = PuzzleError::EmptyBoard;
        assert_eq!(err.code(), "P002");
        assert!(err.help().is_some());
        let detailed = err.display_detailed();
        assert!(detailed.contains("P002"));
        assert!(detailed.contains("2x2"));
    }

    #[test]
    fn test_length_mismatch_includes_values() {
        let err = PuzzleError::LengthMismatch { cells: 9, total: 7 };
        let detailed = err.display_detailed();
        assert!(detailed.contains('9') && detailed.contains('7'));
        assert!(detailed.contains("add up"));
    }

    /// Test that all `PuzzleError` variants have unique error codes
    #[test]
    fn test_all_error_codes_are_unique() {
        let mut codes = std::collections::HashSet::new();

        let errors: Vec<PuzzleError> = vec![
            PuzzleError::ParseFailure { s: "x".to_string() },
            PuzzleError::EmptyBoard,
            PuzzleError::NotSquare { len: 5 },
            PuzzleError::LengthMismatch { cells: 4, total: 3 },
            PuzzleError::TooSmall { len: 1, min: 4 },
            PuzzleError::InvalidLetter { invalid_char: 'X' },
            PuzzleError::ZeroWordLength,
            PuzzleError::NoWordLengths,
            PuzzleError::ParseIntError("x".parse::<usize>().unwrap_err()),
            PuzzleError::NomError(ErrorKind::Tag),
        ];

        for err in errors {
            let code = err.code();
            assert!(code.starts_with('P'), "Error code '{}' should start with 'P'", code);
            assert!(codes.insert(code), "Duplicate error code found: {}", code);
        }

        assert_eq!(codes.len(), 10);
    }

    /// Test that all error codes follow the format P0XX
    #[test]
    fn test_error_code_format() {
        let errors: Vec<PuzzleError> = vec![
            PuzzleError::EmptyBoard,
            PuzzleError::NotSquare { len: 3 },
            PuzzleError::NomError(ErrorKind::Digit),
        ];

        for err in errors {
            let code = err.code();
            assert_eq!(code.len(), 4, "Error code '{}' should be 4 characters (P0XX)", code);
            assert!(code.starts_with("P0"));
            assert!(code[1..].parse::<u16>().is_ok(), "Error code '{}' should end with a number", code);
        }
    }

    #[test]
    fn test_display_detailed_without_help() {
        let err = PuzzleError::NomError(ErrorKind::Tag);
        assert!(err.help().is_none());
        assert_eq!(err.display_detailed(), format!("{} (P010)", err));
    }

    #[test]
    fn test_into_io_error() {
        let io_err: io::Error = PuzzleError::ZeroWordLength.into();
        assert_eq!(io_err.kind(), io::ErrorKind::InvalidInput);
        assert!(io_err.to_string().contains("Word length 0"));
    }
}
