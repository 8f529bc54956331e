// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::errors::SeqPrepError;
use crate::reference::Reference;

/// One atomic edit in compact notation: `<ref><position><mut>`, e.g. `A123T`.
/// `position` is in database numbering, not a string index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationOp {
    pub position: u32,
    pub ref_residue: char,
    pub mut_residue: char,
}

pub const DEFAULT_DELIMITER: char = ';';

// Residue symbols are a single letter, '*' (stop) or '-' (gap). Whether a
// symbol is legal for the loaded reference is checked at application time,
// not here: mutation notation is not constrained to protein alphabets.
fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Za-z*-])([0-9]+)([A-Za-z*-])$").unwrap())
}

/// Tokenize a delimited mutation string into mutation ops. An empty or
/// whitespace-only string means "no mutations" and parses to an empty set;
/// an empty token between delimiters does not, and is rejected.
pub fn parse_mutations(raw: &str, delimiter: char) -> Result<Vec<MutationOp>, SeqPrepError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    trimmed
        .split(delimiter)
        .map(|token| parse_token(token.trim()))
        .collect()
}

fn parse_token(token: &str) -> Result<MutationOp, SeqPrepError> {
    let parse_err = || SeqPrepError::Parse {
        row: String::new(),
        token: token.to_string(),
    };
    let caps = token_re().captures(token).ok_or_else(parse_err)?;
    let position: u32 = caps[2].parse().map_err(|_| parse_err())?;
    Ok(MutationOp {
        position,
        // The captures are single chars by construction.
        ref_residue: caps[1].chars().next().unwrap(),
        mut_residue: caps[3].chars().next().unwrap(),
    })
}

/// Apply a mutation set to the reference, producing a new sequence of the
/// same length (pure-substitution model).
///
/// Each op's position is resolved through the numbering map, and its claimed
/// wild-type residue is checked against the reference at the resolved index.
/// That check is the data-integrity guard of the whole tool: a mismatch means
/// the reference or the numbering is stale, and silently mutating the wrong
/// position would be far worse than failing.
pub fn apply_mutations(reference: &Reference, ops: &[MutationOp]) -> Result<String, SeqPrepError> {
    let original: Vec<char> = reference.sequence.chars().collect();
    let mut buffer = original.clone();
    let mut applied: HashMap<usize, char> = HashMap::new();

    for op in ops {
        let index = reference
            .numbering
            .resolve(op.position)
            .filter(|&i| i < original.len())
            .ok_or(SeqPrepError::UnmappedPosition {
                row: String::new(),
                position: op.position,
            })?;
        // Always compare against the *original* residue: a previous op may
        // already have rewritten buffer[index].
        if original[index] != op.ref_residue {
            return Err(SeqPrepError::ReferenceMismatch {
                row: String::new(),
                position: op.position,
                expected: original[index],
                found: op.ref_residue,
            });
        }
        if let Some(&prev) = applied.get(&index) {
            if prev != op.mut_residue {
                return Err(SeqPrepError::ConflictingMutation {
                    row: String::new(),
                    position: op.position,
                    first: prev,
                    second: op.mut_residue,
                });
            }
            // identical duplicate: idempotent, nothing to do
        } else {
            applied.insert(index, op.mut_residue);
            buffer[index] = op.mut_residue;
        }
    }
    Ok(buffer.into_iter().collect())
}
