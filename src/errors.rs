// SPDX-License-Identifier: MIT

use std::{fmt, io};

/// Everything that can abort a batch run. All variants are fatal: there is no
/// partial-success mode, so each one carries enough context (row identifier,
/// position, expected vs. found) for the operator to fix the input directly.
#[derive(Debug)]
pub enum SeqPrepError {
    Io(io::Error),
    /// Reference sequence or numbering source unreadable or malformed.
    Load(String),
    /// Input table unreadable, or a row does not fit the detected schema.
    Table(String),
    /// A mutation token does not match `<ref><position><mut>`.
    Parse { row: String, token: String },
    /// A mutation references a database position absent from the numbering map.
    UnmappedPosition { row: String, position: u32 },
    /// The claimed wild-type residue does not match the loaded reference.
    ReferenceMismatch {
        row: String,
        position: u32,
        expected: char,
        found: char,
    },
    /// Two mutations in one set disagree on the residue at one position.
    ConflictingMutation {
        row: String,
        position: u32,
        first: char,
        second: char,
    },
    /// Two records in one batch would share a file name.
    DuplicateIdentifier(String),
}

impl SeqPrepError {
    /// Attach the row identifier to an error raised below the batch level.
    /// Parsing and application don't know which row they are working on, so
    /// the orchestrator fills it in before aborting.
    pub fn for_row(self, id: &str) -> Self {
        match self {
            SeqPrepError::Parse { token, .. } => SeqPrepError::Parse {
                row: id.to_string(),
                token,
            },
            SeqPrepError::UnmappedPosition { position, .. } => SeqPrepError::UnmappedPosition {
                row: id.to_string(),
                position,
            },
            SeqPrepError::ReferenceMismatch {
                position,
                expected,
                found,
                ..
            } => SeqPrepError::ReferenceMismatch {
                row: id.to_string(),
                position,
                expected,
                found,
            },
            SeqPrepError::ConflictingMutation {
                position,
                first,
                second,
                ..
            } => SeqPrepError::ConflictingMutation {
                row: id.to_string(),
                position,
                first,
                second,
            },
            other => other,
        }
    }
}

// These allow conversion to SeqPrepError, required for main() to return Result<()> and for '?' to
// work.

impl From<io::Error> for SeqPrepError {
    fn from(e: io::Error) -> Self {
        SeqPrepError::Io(e)
    }
}

impl From<serde_yaml::Error> for SeqPrepError {
    fn from(e: serde_yaml::Error) -> Self {
        SeqPrepError::Load(e.to_string())
    }
}

impl From<csv::Error> for SeqPrepError {
    fn from(e: csv::Error) -> Self {
        SeqPrepError::Table(e.to_string())
    }
}

impl fmt::Display for SeqPrepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeqPrepError::Io(e) => write!(f, "I/O error: {}", e),
            SeqPrepError::Load(msg) => write!(f, "Load error: {}", msg),
            SeqPrepError::Table(msg) => write!(f, "Table error: {}", msg),
            SeqPrepError::Parse { row, token } => {
                write!(f, "row '{}': cannot parse mutation token '{}'", row, token)
            }
            SeqPrepError::UnmappedPosition { row, position } => write!(
                f,
                "row '{}': position {} is absent from the numbering map",
                row, position
            ),
            SeqPrepError::ReferenceMismatch {
                row,
                position,
                expected,
                found,
            } => write!(
                f,
                "row '{}': reference has '{}' at position {}, but the mutation claims '{}' \
                 (stale reference or numbering?)",
                row, expected, position, found
            ),
            SeqPrepError::ConflictingMutation {
                row,
                position,
                first,
                second,
            } => write!(
                f,
                "row '{}': position {} is mutated to both '{}' and '{}'",
                row, position, first, second
            ),
            SeqPrepError::DuplicateIdentifier(id) => {
                write!(f, "duplicate record identifier '{}'", id)
            }
        }
    }
}
